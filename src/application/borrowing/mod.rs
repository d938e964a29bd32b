mod borrowing_service;
mod errors;

pub use borrowing_service::{
    ServiceDependencies, create_borrowing, delete_borrowing, get_borrowing, list_borrowings,
    return_borrowing, update_borrowing,
};
pub use errors::{BorrowingApplicationError, Result};
