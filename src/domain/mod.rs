pub mod book;
pub mod borrower;
pub mod borrowing;
pub mod commands;
pub mod value_objects;

pub use book::Book;
pub use borrower::Borrower;
pub use borrowing::{Borrowing, BorrowingPatch};
pub use value_objects::*;
