use crate::domain::{
    Book, Borrower, Borrowing,
    value_objects::{BookId, BorrowerId, BorrowingId},
};
use crate::ports::transaction::{Result, Transaction};
use async_trait::async_trait;
use sqlx::Postgres;

use super::PostgresStoreError;
use super::entity_store::{
    BORROWING_COLUMNS, map_row_to_book, map_row_to_borrower, map_row_to_borrowing,
};

/// sqlxのトランザクションをラップしたTransaction実装
///
/// コミットせずにdropされた場合、sqlxが接続をプールに返す前にロールバックする。
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PostgresTransaction {
    pub fn new(tx: sqlx::Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Transaction for PostgresTransaction {
    /// 書籍を取得し、トランザクション終了まで削除をブロックする
    async fn find_book(&mut self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description
            FROM books
            WHERE id = $1
            FOR KEY SHARE
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    /// 利用者を取得し、トランザクション終了まで削除をブロックする
    ///
    /// FOR KEY SHAREは後続のborrow_history更新（NO KEY UPDATE）と競合しない。
    async fn find_borrower(&mut self, borrower_id: BorrowerId) -> Result<Option<Borrower>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, membership_id, borrow_history
            FROM borrowers
            WHERE id = $1
            FOR KEY SHARE
            "#,
        )
        .bind(borrower_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_borrower).transpose()
    }

    async fn insert_borrowing(&mut self, borrowing: &Borrowing) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO borrowings (
                id,
                book_id,
                borrower_id,
                status,
                borrow_date,
                due_date,
                return_date,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(borrowing.id.value())
        .bind(borrowing.book_id.value())
        .bind(borrowing.borrower_id.value())
        .bind(borrowing.status.as_str())
        .bind(borrowing.borrow_date)
        .bind(borrowing.due_date)
        .bind(borrowing.return_date)
        .bind(borrowing.created_at)
        .bind(borrowing.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    /// array_appendによる単一UPDATEで追記する
    async fn append_borrow_history(
        &mut self,
        borrower_id: BorrowerId,
        borrowing_id: BorrowingId,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE borrowers
            SET borrow_history = array_append(borrow_history, $2)
            WHERE id = $1
            "#,
        )
        .bind(borrower_id.value())
        .bind(borrowing_id.value())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PostgresStoreError::BorrowerNotFound(borrower_id).into());
        }

        Ok(())
    }

    async fn delete_borrowing(&mut self, borrowing_id: BorrowingId) -> Result<Option<Borrowing>> {
        let row = sqlx::query(&format!(
            "DELETE FROM borrowings WHERE id = $1 RETURNING {BORROWING_COLUMNS}"
        ))
        .bind(borrowing_id.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_borrowing).transpose()
    }

    async fn remove_borrow_history(
        &mut self,
        borrower_id: BorrowerId,
        borrowing_id: BorrowingId,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE borrowers
            SET borrow_history = array_remove(borrow_history, $2)
            WHERE id = $1
            "#,
        )
        .bind(borrower_id.value())
        .bind(borrowing_id.value())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        let Self { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
