use crate::domain::{
    Book, Borrower,
    value_objects::{BookId, BorrowerId},
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::entity_store::EntityStore;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read seed file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid seed data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// インメモリストアの初期データ
///
/// ```json
/// {
///   "books": [{ "id": "...", "title": "...", "description": "..." }],
///   "borrowers": [{ "id": "...", "name": "...", "membershipId": "..." }]
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub books: Vec<SeedBook>,
    #[serde(default)]
    pub borrowers: Vec<SeedBorrower>,
}

#[derive(Debug, Deserialize)]
pub struct SeedBook {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedBorrower {
    pub id: Uuid,
    pub name: String,
    pub membership_id: String,
}

impl Seed {
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let json = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

impl EntityStore {
    /// 初期データを登録する
    ///
    /// 利用者の貸出履歴は空から始まる。
    pub fn apply_seed(&self, seed: Seed) {
        for book in seed.books {
            self.add_book(Book {
                id: BookId::from_uuid(book.id),
                title: book.title,
                description: book.description,
            });
        }

        for borrower in seed.borrowers {
            self.add_borrower(Borrower {
                id: BorrowerId::from_uuid(borrower.id),
                name: borrower.name,
                membership_id: borrower.membership_id,
                borrow_history: Vec::new(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::EntityStore as _;

    const SEED_JSON: &str = r#"{
        "books": [
            {
                "id": "0b5b7a2e-3f0c-4a8e-9c1d-2f6b8e4a1c3d",
                "title": "Parable of the Sower",
                "description": "Earthseed"
            },
            { "id": "5d2c9e1f-7a4b-4c3e-8f6d-1b9a0e2c4d7f", "title": "Lilith's Brood" }
        ],
        "borrowers": [
            {
                "id": "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d",
                "name": "Lauren Olamina",
                "membershipId": "M-2024"
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_apply_seed_registers_books_and_borrowers() {
        let store = EntityStore::new();
        let seed = Seed::from_json(SEED_JSON).unwrap();

        store.apply_seed(seed);

        let book_id = BookId::from_uuid(
            Uuid::parse_str("5d2c9e1f-7a4b-4c3e-8f6d-1b9a0e2c4d7f").unwrap(),
        );
        let book = store.find_book(book_id).await.unwrap().unwrap();
        assert_eq!(book.title, "Lilith's Brood");
        assert_eq!(book.description, "");

        let borrower_id = BorrowerId::from_uuid(
            Uuid::parse_str("9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d").unwrap(),
        );
        let borrower = store.find_borrower(borrower_id).await.unwrap().unwrap();
        assert_eq!(borrower.membership_id, "M-2024");
        assert!(borrower.borrow_history.is_empty());
    }

    #[test]
    fn test_empty_seed() {
        let seed = Seed::from_json("{}").unwrap();
        assert!(seed.books.is_empty());
        assert!(seed.borrowers.is_empty());
    }

    #[test]
    fn test_invalid_seed_is_rejected() {
        let result = Seed::from_json(r#"{ "books": [{ "title": "No id" }] }"#);
        assert!(matches!(result, Err(SeedError::Parse(_))));
    }

    #[test]
    fn test_missing_seed_file() {
        let result = Seed::load(Path::new("/nonexistent/seed.json"));
        assert!(matches!(result, Err(SeedError::Io { .. })));
    }
}
