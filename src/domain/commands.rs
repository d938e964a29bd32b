use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, BorrowerId, BorrowingId, BorrowingPatch, BorrowingStatus};

/// クエリ：貸出記録の一覧を取得する
///
/// statusは完全一致のフィルタ。未指定の場合は全件。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBorrowings {
    pub status: Option<String>,
}

/// コマンド：貸出記録を作成する
///
/// 参照IDがリクエストに含まれない場合は、参照先が存在しないものとして扱う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBorrowing {
    pub book_id: Option<BookId>,
    pub borrower_id: Option<BorrowerId>,
    pub status: Option<BorrowingStatus>,
    pub borrow_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// コマンド：貸出記録を更新する
///
/// IDはリクエストに含まれない場合がある（その場合は検証エラー）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBorrowing {
    pub id: Option<BorrowingId>,
    pub patch: BorrowingPatch,
    pub updated_at: DateTime<Utc>,
}

/// コマンド：貸出記録を削除する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBorrowing {
    pub id: Option<BorrowingId>,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBorrowing {
    pub id: Option<BorrowingId>,
    pub returned_at: DateTime<Utc>,
}
