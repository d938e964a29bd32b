pub mod entity_store;
pub mod transaction;

use crate::domain::value_objects::BorrowerId;

// パブリックに型を再エクスポート
pub use entity_store::EntityStore as PostgresEntityStore;
pub use transaction::PostgresTransaction;

/// PostgreSQLアダプター固有のエラー
#[derive(Debug, thiserror::Error)]
pub enum PostgresStoreError {
    #[error("Borrower {0} not found")]
    BorrowerNotFound(BorrowerId),
}
