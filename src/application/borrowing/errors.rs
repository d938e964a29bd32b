use crate::domain::value_objects::{BookId, BorrowerId, BorrowingId};
use thiserror::Error;

/// 貸出記録アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum BorrowingApplicationError {
    /// リクエストにIDが含まれていない
    #[error("ID not provided!")]
    MissingId,

    /// 作成時に指定された書籍が存在しない（IDの指定なしを含む）
    #[error("Book not found")]
    BookNotFound(Option<BookId>),

    /// 作成時に指定された利用者が存在しない（IDの指定なしを含む）
    #[error("Borrower not found")]
    BorrowerNotFound(Option<BorrowerId>),

    /// 返却対象の貸出記録が存在しない
    ///
    /// get/update/deleteと異なり、回復不能な障害として扱う。
    #[error("Borrowing {0} to return does not exist")]
    ReturnTargetMissing(BorrowingId),

    /// EntityStoreのエラー
    #[error("Entity store error: {0}")]
    StoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// トランザクションの開始・確定のエラー
    #[error("Transaction error: {0}")]
    TransactionError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BorrowingApplicationError {
    /// 呼び出し側の入力に起因するエラーか
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BorrowingApplicationError::MissingId
                | BorrowingApplicationError::BookNotFound(_)
                | BorrowingApplicationError::BorrowerNotFound(_)
        )
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, BorrowingApplicationError>;
