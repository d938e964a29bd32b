use crate::domain::{
    Borrowing, borrowing,
    commands::*,
    value_objects::{BorrowingId, BorrowingStatus},
};
use crate::ports::*;
use std::sync::Arc;

use super::errors::{BorrowingApplicationError, Result};

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、各操作の関数に依存関係を渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub entity_store: Arc<dyn EntityStore>,
}

/// トランザクションを終了するヘルパー関数
///
/// 成功時はコミット、失敗時は中止する。
/// 中止自体が失敗した場合はログに記録し、元のエラーを返す。
/// どちらの場合もハンドルは消費され、資源は解放される。
async fn finish_transaction<T>(tx: Box<dyn Transaction>, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(BorrowingApplicationError::TransactionError)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(abort_err) = tx.abort().await {
                tracing::error!(error = %abort_err, "Failed to abort transaction");
            }
            Err(err)
        }
    }
}

/// トランザクション内で参照先を確認し、貸出記録と履歴を書き込む
async fn stage_new_borrowing(tx: &mut dyn Transaction, cmd: &CreateBorrowing) -> Result<Borrowing> {
    // 1. 書籍と利用者の存在確認（IDの指定がなければ存在しない）
    let book = match cmd.book_id {
        Some(book_id) => tx
            .find_book(book_id)
            .await
            .map_err(BorrowingApplicationError::StoreError)?,
        None => None,
    };
    let borrower = match cmd.borrower_id {
        Some(borrower_id) => tx
            .find_borrower(borrower_id)
            .await
            .map_err(BorrowingApplicationError::StoreError)?,
        None => None,
    };

    let Some(book) = book else {
        return Err(BorrowingApplicationError::BookNotFound(cmd.book_id));
    };
    let Some(borrower) = borrower else {
        return Err(BorrowingApplicationError::BorrowerNotFound(cmd.borrower_id));
    };

    // 2. ドメイン層の純粋関数で貸出記録を作成
    let new_borrowing = borrowing::open_borrowing(
        book.id,
        borrower.id,
        cmd.status,
        cmd.borrow_date,
        cmd.due_date,
        cmd.created_at,
    );

    // 3. 貸出記録を挿入
    tx.insert_borrowing(&new_borrowing)
        .await
        .map_err(BorrowingApplicationError::StoreError)?;

    // 4. 利用者の貸出履歴に追記
    tx.append_borrow_history(borrower.id, new_borrowing.id)
        .await
        .map_err(BorrowingApplicationError::StoreError)?;

    Ok(new_borrowing)
}

/// トランザクション内で貸出記録を削除し、利用者の履歴からも取り除く
async fn stage_removal(
    tx: &mut dyn Transaction,
    borrowing_id: BorrowingId,
) -> Result<Option<Borrowing>> {
    let deleted = tx
        .delete_borrowing(borrowing_id)
        .await
        .map_err(BorrowingApplicationError::StoreError)?;

    if let Some(ref removed) = deleted {
        tx.remove_borrow_history(removed.borrower_id, removed.id)
            .await
            .map_err(BorrowingApplicationError::StoreError)?;
    }

    Ok(deleted)
}

/// 貸出記録の一覧を取得する
///
/// statusが指定された場合は完全一致で絞り込む。
/// 既知のステータスでない文字列はどの記録にも一致しないため、空の一覧を返す。
/// 結果は書籍（title, description）と利用者（membership_id, name）で補完される。
pub async fn list_borrowings(
    deps: &ServiceDependencies,
    query: ListBorrowings,
) -> Result<Vec<BorrowingDetails>> {
    let filter = match query.status.as_deref().filter(|s| !s.is_empty()) {
        None => BorrowingFilter::default(),
        Some(status) => match status.parse::<BorrowingStatus>() {
            Ok(status) => BorrowingFilter {
                status: Some(status),
            },
            Err(_) => {
                tracing::debug!(status, "Unknown status filter matches no borrowings");
                return Ok(Vec::new());
            }
        },
    };

    deps.entity_store
        .find_borrowings(filter)
        .await
        .map_err(BorrowingApplicationError::StoreError)
}

/// IDで貸出記録を取得する
///
/// 存在しない場合はエラーではなくNoneを返す。参照先の補完はしない。
pub async fn get_borrowing(
    deps: &ServiceDependencies,
    borrowing_id: BorrowingId,
) -> Result<Option<Borrowing>> {
    deps.entity_store
        .find_borrowing(borrowing_id)
        .await
        .map_err(BorrowingApplicationError::StoreError)
}

/// 貸出記録を作成する
///
/// 1つのトランザクション内で以下を順に実行する：
/// 1. 書籍と利用者の存在確認（どちらかが無ければ検証エラー）
/// 2. 貸出記録の挿入
/// 3. 利用者の貸出履歴への追記
///
/// すべて成功した場合のみコミットする。途中で失敗した場合は中止し、
/// 貸出記録も履歴の追記も残らない。
pub async fn create_borrowing(deps: &ServiceDependencies, cmd: CreateBorrowing) -> Result<Borrowing> {
    let mut tx = deps
        .entity_store
        .begin()
        .await
        .map_err(BorrowingApplicationError::TransactionError)?;

    let outcome = stage_new_borrowing(tx.as_mut(), &cmd).await;
    if let Err(ref err) = outcome {
        if err.is_client_error() {
            tracing::warn!(
                error = %err,
                book_id = ?cmd.book_id,
                borrower_id = ?cmd.borrower_id,
                "Rejected borrowing creation"
            );
        }
    }

    let created = finish_transaction(tx, outcome).await?;

    tracing::info!(
        borrowing_id = %created.id,
        book_id = %created.book_id,
        borrower_id = %created.borrower_id,
        "Borrowing created"
    );

    Ok(created)
}

/// 貸出記録を更新する
///
/// 許可されたフィールド（borrow_date, due_date）のみを変更する。
/// IDが無い場合はストアにアクセスせず検証エラー。
/// 記録が存在しない場合はNoneを返す。
pub async fn update_borrowing(
    deps: &ServiceDependencies,
    cmd: UpdateBorrowing,
) -> Result<Option<Borrowing>> {
    let borrowing_id = cmd.id.ok_or(BorrowingApplicationError::MissingId)?;

    deps.entity_store
        .update_borrowing(borrowing_id, &cmd.patch, cmd.updated_at)
        .await
        .map_err(BorrowingApplicationError::StoreError)
}

/// 貸出記録を削除する
///
/// 削除と、所有する利用者の貸出履歴からのID除去を1つのトランザクションで行う。
/// 記録が存在しない場合はNoneを返す。
pub async fn delete_borrowing(
    deps: &ServiceDependencies,
    cmd: DeleteBorrowing,
) -> Result<Option<Borrowing>> {
    let borrowing_id = cmd.id.ok_or(BorrowingApplicationError::MissingId)?;

    let mut tx = deps
        .entity_store
        .begin()
        .await
        .map_err(BorrowingApplicationError::TransactionError)?;

    let outcome = stage_removal(tx.as_mut(), borrowing_id).await;
    let deleted = finish_transaction(tx, outcome).await?;

    if deleted.is_some() {
        tracing::info!(borrowing_id = %borrowing_id, "Borrowing deleted");
    }

    Ok(deleted)
}

/// 書籍を返却する
///
/// statusをRETURNEDにし、return_dateを記録して保存する。
/// 冪等ではない：返却済みの記録でも遷移を再実行する。
///
/// 記録が存在しない場合は、他の操作と異なりReturnTargetMissing
/// （サーバー側の障害）として扱う。取得後、保存までの間に削除された場合も同様。
pub async fn return_borrowing(deps: &ServiceDependencies, cmd: ReturnBorrowing) -> Result<Borrowing> {
    let borrowing_id = cmd.id.ok_or(BorrowingApplicationError::MissingId)?;

    // 1. 貸出記録を取得
    let existing = deps
        .entity_store
        .find_borrowing(borrowing_id)
        .await
        .map_err(BorrowingApplicationError::StoreError)?
        .ok_or(BorrowingApplicationError::ReturnTargetMissing(borrowing_id))?;

    // 2. ドメイン層の純粋関数で状態遷移
    let returned = borrowing::return_borrowing(existing, cmd.returned_at);

    // 3. 保存（削除済みの記録は再作成しない）
    let saved = deps
        .entity_store
        .save_borrowing(&returned)
        .await
        .map_err(BorrowingApplicationError::StoreError)?
        .ok_or(BorrowingApplicationError::ReturnTargetMissing(borrowing_id))?;

    tracing::info!(borrowing_id = %borrowing_id, "Borrowing returned");

    Ok(saved)
}
