use crate::domain::{
    Book, Borrower, Borrowing, BorrowingPatch,
    value_objects::{BookId, BorrowerId, BorrowingId, BorrowingStatus},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::transaction::Transaction;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 一覧取得のフィルタ
///
/// statusのみ完全一致で絞り込む。未指定は全件。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BorrowingFilter {
    pub status: Option<BorrowingStatus>,
}

/// 書籍の表示用射影（title, description）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSummary {
    pub id: BookId,
    pub title: String,
    pub description: String,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            description: book.description.clone(),
        }
    }
}

/// 利用者の表示用射影（membership_id, name）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowerSummary {
    pub id: BorrowerId,
    pub membership_id: String,
    pub name: String,
}

impl From<&Borrower> for BorrowerSummary {
    fn from(borrower: &Borrower) -> Self {
        Self {
            id: borrower.id,
            membership_id: borrower.membership_id.clone(),
            name: borrower.name.clone(),
        }
    }
}

/// 参照先を解決した貸出記録（読み取り時の射影）
///
/// 保存データは変更しない。参照先が存在しない場合はNone。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowingDetails {
    pub borrowing: Borrowing,
    pub book: Option<BookSummary>,
    pub borrower: Option<BorrowerSummary>,
}

/// エンティティストアポート
///
/// Book, Borrower, Borrowingの3種類のエンティティの永続化を抽象化する。
/// 複数エンティティにまたがる書き込みは`begin()`で得たトランザクション上で行う。
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// トランザクションを開始する
    ///
    /// 返されたハンドルは必ず`commit`または`abort`で終了すること。
    /// 終了せずにdropした場合、書き込みは破棄される。
    async fn begin(&self) -> Result<Box<dyn Transaction>>;

    /// IDで書籍を取得する
    async fn find_book(&self, book_id: BookId) -> Result<Option<Book>>;

    /// IDで利用者を取得する
    async fn find_borrower(&self, borrower_id: BorrowerId) -> Result<Option<Borrower>>;

    /// IDで貸出記録を取得する（参照先の解決はしない）
    async fn find_borrowing(&self, borrowing_id: BorrowingId) -> Result<Option<Borrowing>>;

    /// フィルタに一致する貸出記録を参照先を解決して取得する
    ///
    /// 一致しない場合は空のVecを返す。
    async fn find_borrowings(&self, filter: BorrowingFilter) -> Result<Vec<BorrowingDetails>>;

    /// 許可されたフィールドのみを更新する
    ///
    /// 更新後の記録を返す。存在しない場合はNone。
    async fn update_borrowing(
        &self,
        borrowing_id: BorrowingId,
        patch: &BorrowingPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Borrowing>>;

    /// 既存の貸出記録の完全な状態を保存する
    ///
    /// 新しい記録は挿入しない。保存後の記録を返し、既に存在しない場合はNone。
    async fn save_borrowing(&self, borrowing: &Borrowing) -> Result<Option<Borrowing>>;
}
