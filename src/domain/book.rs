use serde::{Deserialize, Serialize};

use super::BookId;

/// 書籍
///
/// 貸出コンテキストからは参照のみで、変更されない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub description: String,
}

impl Book {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: BookId::new(),
            title: title.into(),
            description: description.into(),
        }
    }
}
