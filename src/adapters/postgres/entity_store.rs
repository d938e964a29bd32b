use crate::domain::{
    Book, Borrower, Borrowing, BorrowingPatch,
    value_objects::{BookId, BorrowerId, BorrowingId, BorrowingStatus},
};
use crate::ports::entity_store::{
    BookSummary, BorrowerSummary, BorrowingDetails, BorrowingFilter,
    EntityStore as EntityStoreTrait, Result,
};
use crate::ports::transaction::Transaction;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;
use uuid::Uuid;

use super::transaction::PostgresTransaction;

/// 貸出記録の取得で共通に使うカラム
pub(super) const BORROWING_COLUMNS: &str = r#"
    id,
    book_id,
    borrower_id,
    status,
    borrow_date,
    due_date,
    return_date,
    created_at,
    updated_at
"#;

/// PostgreSQLの行データをBorrowingに変換する
///
/// statusの文字列からの変換でエラーハンドリングを行う。
pub(super) fn map_row_to_borrowing(row: &PgRow) -> Result<Borrowing> {
    let status_str: &str = row.try_get("status")?;
    let status = BorrowingStatus::from_str(status_str).map_err(|e| {
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            as Box<dyn std::error::Error + Send + Sync>
    })?;

    Ok(Borrowing {
        id: BorrowingId::from_uuid(row.try_get("id")?),
        book_id: BookId::from_uuid(row.try_get("book_id")?),
        borrower_id: BorrowerId::from_uuid(row.try_get("borrower_id")?),
        status,
        borrow_date: row.try_get("borrow_date")?,
        due_date: row.try_get("due_date")?,
        return_date: row.try_get("return_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(super) fn map_row_to_book(row: &PgRow) -> Result<Book> {
    Ok(Book {
        id: BookId::from_uuid(row.try_get("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
    })
}

pub(super) fn map_row_to_borrower(row: &PgRow) -> Result<Borrower> {
    let history: Vec<Uuid> = row.try_get("borrow_history")?;

    Ok(Borrower {
        id: BorrowerId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        membership_id: row.try_get("membership_id")?,
        borrow_history: history.into_iter().map(BorrowingId::from_uuid).collect(),
    })
}

/// LEFT JOINの結果をBorrowingDetailsに変換する
///
/// 参照先が存在しない場合、結合したカラムはNULLになる。
fn map_row_to_details(row: &PgRow) -> Result<BorrowingDetails> {
    let borrowing = map_row_to_borrowing(row)?;

    let book_title: Option<String> = row.try_get("book_title")?;
    let book_description: Option<String> = row.try_get("book_description")?;
    let book = book_title.map(|title| BookSummary {
        id: borrowing.book_id,
        title,
        description: book_description.unwrap_or_default(),
    });

    let borrower_name: Option<String> = row.try_get("borrower_name")?;
    let borrower_membership_id: Option<String> = row.try_get("borrower_membership_id")?;
    let borrower = borrower_name.map(|name| BorrowerSummary {
        id: borrowing.borrower_id,
        membership_id: borrower_membership_id.unwrap_or_default(),
        name,
    });

    Ok(BorrowingDetails {
        borrowing,
        book,
        borrower,
    })
}

/// EntityStoreのPostgreSQL実装
///
/// books, borrowers, borrowingsの3テーブルを扱う。
/// 複数テーブルにまたがる書き込みは`begin()`で得る`PostgresTransaction`上で行う。
pub struct EntityStore {
    pool: PgPool,
}

impl EntityStore {
    /// PostgreSQLコネクションプールから新しいEntityStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStoreTrait for EntityStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction::new(tx)))
    }

    async fn find_book(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    async fn find_borrower(&self, borrower_id: BorrowerId) -> Result<Option<Borrower>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, membership_id, borrow_history
            FROM borrowers
            WHERE id = $1
            "#,
        )
        .bind(borrower_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_borrower).transpose()
    }

    async fn find_borrowing(&self, borrowing_id: BorrowingId) -> Result<Option<Borrowing>> {
        let row = sqlx::query(&format!(
            "SELECT {BORROWING_COLUMNS} FROM borrowings WHERE id = $1"
        ))
        .bind(borrowing_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_borrowing).transpose()
    }

    /// 貸出記録を書籍・利用者と結合して取得
    ///
    /// statusが未指定の場合は全件。(status)インデックスを使用する。
    async fn find_borrowings(&self, filter: BorrowingFilter) -> Result<Vec<BorrowingDetails>> {
        sqlx::query(
            r#"
            SELECT
                b.id,
                b.book_id,
                b.borrower_id,
                b.status,
                b.borrow_date,
                b.due_date,
                b.return_date,
                b.created_at,
                b.updated_at,
                bk.title AS book_title,
                bk.description AS book_description,
                br.name AS borrower_name,
                br.membership_id AS borrower_membership_id
            FROM borrowings b
            LEFT JOIN books bk ON bk.id = b.book_id
            LEFT JOIN borrowers br ON br.id = b.borrower_id
            WHERE ($1::varchar IS NULL OR b.status = $1)
            ORDER BY b.created_at ASC
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .fetch(&self.pool)
        .map(|row| map_row_to_details(&row?))
        .try_collect()
        .await
    }

    async fn update_borrowing(
        &self,
        borrowing_id: BorrowingId,
        patch: &BorrowingPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Borrowing>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE borrowings
            SET
                borrow_date = COALESCE($2, borrow_date),
                due_date = COALESCE($3, due_date),
                updated_at = $4
            WHERE id = $1
            RETURNING {BORROWING_COLUMNS}
            "#
        ))
        .bind(borrowing_id.value())
        .bind(patch.borrow_date)
        .bind(patch.due_date)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_borrowing).transpose()
    }

    /// 既存の貸出記録を上書き保存する
    ///
    /// 行が既に削除されていれば何もせずNoneを返す。
    async fn save_borrowing(&self, borrowing: &Borrowing) -> Result<Option<Borrowing>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE borrowings
            SET
                status = $2,
                borrow_date = $3,
                due_date = $4,
                return_date = $5,
                updated_at = $6
            WHERE id = $1
            RETURNING {BORROWING_COLUMNS}
            "#
        ))
        .bind(borrowing.id.value())
        .bind(borrowing.status.as_str())
        .bind(borrowing.borrow_date)
        .bind(borrowing.due_date)
        .bind(borrowing.return_date)
        .bind(borrowing.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_borrowing).transpose()
    }
}
