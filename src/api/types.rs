use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Borrowing, BorrowingPatch,
    commands::{CreateBorrowing, ListBorrowings},
    value_objects::{BookId, BorrowerId, BorrowingId, BorrowingStatus},
};
use crate::ports::{BookSummary, BorrowerSummary, BorrowingDetails};

/// 貸出記録一覧取得のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct ListBorrowingsQuery {
    /// ステータスでフィルタリング（完全一致）
    pub status: Option<String>,
}

impl ListBorrowingsQuery {
    pub fn to_query(self) -> ListBorrowings {
        ListBorrowings {
            status: self.status,
        }
    }
}

/// 貸出記録作成リクエスト（POST /borrowings）
///
/// bookId, borrowerIdが無い場合も受け付け、参照先なしとして検証エラーにする。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBorrowingRequest {
    pub book_id: Option<Uuid>,
    pub borrower_id: Option<Uuid>,
    pub status: Option<BorrowingStatus>,
    pub borrow_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

impl CreateBorrowingRequest {
    pub fn to_command(self, created_at: DateTime<Utc>) -> CreateBorrowing {
        CreateBorrowing {
            book_id: self.book_id.map(BookId::from_uuid),
            borrower_id: self.borrower_id.map(BorrowerId::from_uuid),
            status: self.status,
            borrow_date: self.borrow_date,
            due_date: self.due_date,
            created_at,
        }
    }
}

/// 貸出記録更新リクエスト（PUT /borrowings/:id）
///
/// 変更可能なフィールドのみを受け付ける。
/// bookId, borrowerId, statusなどを含むリクエストは拒否される。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateBorrowingRequest {
    pub borrow_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<UpdateBorrowingRequest> for BorrowingPatch {
    fn from(req: UpdateBorrowingRequest) -> Self {
        Self {
            borrow_date: req.borrow_date,
            due_date: req.due_date,
        }
    }
}

/// 返却リクエスト（POST /borrowings/return）
///
/// IDはパスではなくボディで受け取る。
#[derive(Debug, Default, Deserialize)]
pub struct ReturnBorrowingRequest {
    pub id: Option<String>,
}

impl ReturnBorrowingRequest {
    /// UUIDとして解釈できないIDは指定なしとして扱う
    pub fn borrowing_id(&self) -> Option<BorrowingId> {
        self.id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .map(BorrowingId::from_uuid)
    }
}

/// 貸出記録レスポンス
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingResponse {
    pub id: Uuid,
    pub book_id: Uuid,
    pub borrower_id: Uuid,
    pub status: String,
    pub borrow_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Borrowing> for BorrowingResponse {
    fn from(borrowing: Borrowing) -> Self {
        Self {
            id: borrowing.id.value(),
            book_id: borrowing.book_id.value(),
            borrower_id: borrowing.borrower_id.value(),
            status: borrowing.status.as_str().to_string(),
            borrow_date: borrowing.borrow_date,
            due_date: borrowing.due_date,
            return_date: borrowing.return_date,
            created_at: borrowing.created_at,
            updated_at: borrowing.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummaryResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
}

impl From<BookSummary> for BookSummaryResponse {
    fn from(book: BookSummary) -> Self {
        Self {
            id: book.id.value(),
            title: book.title,
            description: book.description,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerSummaryResponse {
    pub id: Uuid,
    pub membership_id: String,
    pub name: String,
}

impl From<BorrowerSummary> for BorrowerSummaryResponse {
    fn from(borrower: BorrowerSummary) -> Self {
        Self {
            id: borrower.id.value(),
            membership_id: borrower.membership_id,
            name: borrower.name,
        }
    }
}

/// 参照先を補完した貸出記録レスポンス（GET /borrowings）
#[derive(Debug, Serialize)]
pub struct BorrowingDetailsResponse {
    #[serde(flatten)]
    pub borrowing: BorrowingResponse,
    pub book: Option<BookSummaryResponse>,
    pub borrower: Option<BorrowerSummaryResponse>,
}

impl From<BorrowingDetails> for BorrowingDetailsResponse {
    fn from(details: BorrowingDetails) -> Self {
        Self {
            borrowing: BorrowingResponse::from(details.borrowing),
            book: details.book.map(BookSummaryResponse::from),
            borrower: details.borrower.map(BorrowerSummaryResponse::from),
        }
    }
}

/// 成功レスポンスのエンベロープ
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// エラーレスポンスのエンベロープ
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error_type.into(),
            message: message.into(),
        }
    }
}
