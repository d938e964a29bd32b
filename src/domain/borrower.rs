use serde::{Deserialize, Serialize};

use super::{BorrowerId, BorrowingId};

/// 利用者
///
/// `borrow_history` は利用者が所有する逆参照リスト。
/// トランザクションを通じて作成された貸出記録のIDのみが、作成順に追記される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrower {
    pub id: BorrowerId,
    pub name: String,
    pub membership_id: String,
    pub borrow_history: Vec<BorrowingId>,
}

impl Borrower {
    /// 履歴が空の利用者を作成する
    pub fn new(name: impl Into<String>, membership_id: impl Into<String>) -> Self {
        Self {
            id: BorrowerId::new(),
            name: name.into(),
            membership_id: membership_id.into(),
            borrow_history: Vec::new(),
        }
    }

    /// 貸出記録IDを履歴の末尾に追加する
    pub fn record_borrowing(&mut self, borrowing_id: BorrowingId) {
        self.borrow_history.push(borrowing_id);
    }

    /// 削除された貸出記録IDを履歴から取り除く
    pub fn forget_borrowing(&mut self, borrowing_id: BorrowingId) {
        self.borrow_history.retain(|id| *id != borrowing_id);
    }
}
