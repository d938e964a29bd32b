use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, BorrowerId, BorrowingId, BorrowingStatus};

/// Borrowing集約 - 1冊の書籍と1人の利用者を結ぶ貸出記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrowing {
    // 識別子
    pub id: BorrowingId,

    // 他の集約への参照（IDのみ）
    pub book_id: BookId,
    pub borrower_id: BorrowerId,

    // 貸出管理の責務
    pub status: BorrowingStatus,
    pub borrow_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,

    // 監査情報
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 更新で変更を許可するフィールド
///
/// 参照（book_id, borrower_id）とstatusは含めない。
/// statusの変更は返却（`return_borrowing`）でのみ行う。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowingPatch {
    pub borrow_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
}

impl BorrowingPatch {
    /// 純粋関数：指定されたフィールドのみを上書きする
    ///
    /// 指定のないフィールドは元の値を保持する。
    pub fn apply(&self, borrowing: Borrowing, updated_at: DateTime<Utc>) -> Borrowing {
        Borrowing {
            borrow_date: self.borrow_date.unwrap_or(borrowing.borrow_date),
            due_date: self.due_date.or(borrowing.due_date),
            updated_at,
            ..borrowing
        }
    }
}

/// 純粋関数：貸出記録を作成する
///
/// ビジネスルール：
/// - statusの指定がなければACTIVE
/// - borrow_dateの指定がなければ作成日時
/// - return_dateは未設定
///
/// 参照先の存在確認はアプリケーション層の責務（トランザクション内で行う）。
pub fn open_borrowing(
    book_id: BookId,
    borrower_id: BorrowerId,
    status: Option<BorrowingStatus>,
    borrow_date: Option<DateTime<Utc>>,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
) -> Borrowing {
    Borrowing {
        id: BorrowingId::new(),
        book_id,
        borrower_id,
        status: status.unwrap_or_default(),
        borrow_date: borrow_date.unwrap_or(created_at),
        due_date,
        return_date: None,
        created_at,
        updated_at: created_at,
    }
}

/// 純粋関数：貸出記録を返却済みにする
///
/// どの状態からでもRETURNEDへ遷移し、return_dateを記録する。
/// 冪等ではない：返却済みの記録に対しても遷移を実行し、return_dateを更新する。
///
/// return_dateは作成日時より前にならない。
pub fn return_borrowing(borrowing: Borrowing, returned_at: DateTime<Utc>) -> Borrowing {
    let return_date = returned_at.max(borrowing.created_at);

    Borrowing {
        status: BorrowingStatus::Returned,
        return_date: Some(return_date),
        updated_at: return_date,
        ..borrowing
    }
}
