pub mod entity_store;
pub mod transaction;

pub use entity_store::{
    BookSummary, BorrowerSummary, BorrowingDetails, BorrowingFilter, EntityStore,
};
pub use transaction::Transaction;
