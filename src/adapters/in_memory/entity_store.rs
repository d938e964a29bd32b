use crate::domain::{
    Book, Borrower, Borrowing, BorrowingPatch,
    value_objects::{BookId, BorrowerId, BorrowingId},
};
use crate::ports::entity_store::{
    BookSummary, BorrowerSummary, BorrowingDetails, BorrowingFilter,
    EntityStore as EntityStoreTrait, Result,
};
use crate::ports::transaction::Transaction;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::transaction::InMemoryTransaction;

/// インメモリストアのエラー
#[derive(Debug, thiserror::Error)]
pub enum InMemoryStoreError {
    #[error("Borrower {0} not found")]
    BorrowerNotFound(BorrowerId),

    #[error("Borrowing {0} already exists")]
    DuplicateBorrowing(BorrowingId),
}

/// 3種類のエンティティのコレクション
///
/// 貸出記録は挿入順を保持する。
#[derive(Debug, Clone, Default)]
pub(super) struct Collections {
    pub(super) books: HashMap<BookId, Book>,
    pub(super) borrowers: HashMap<BorrowerId, Borrower>,
    pub(super) borrowings: Vec<Borrowing>,
}

impl Collections {
    pub(super) fn borrowing(&self, borrowing_id: BorrowingId) -> Option<&Borrowing> {
        self.borrowings.iter().find(|b| b.id == borrowing_id)
    }

    fn borrowing_mut(&mut self, borrowing_id: BorrowingId) -> Option<&mut Borrowing> {
        self.borrowings.iter_mut().find(|b| b.id == borrowing_id)
    }

    fn details(&self, borrowing: &Borrowing) -> BorrowingDetails {
        BorrowingDetails {
            borrowing: borrowing.clone(),
            book: self.books.get(&borrowing.book_id).map(BookSummary::from),
            borrower: self
                .borrowers
                .get(&borrowing.borrower_id)
                .map(BorrowerSummary::from),
        }
    }
}

/// トランザクションの開始・終了回数
#[derive(Debug, Default)]
pub(super) struct TransactionCounters {
    pub(super) begun: AtomicUsize,
    pub(super) committed: AtomicUsize,
    pub(super) aborted: AtomicUsize,
}

/// EntityStoreのインメモリ実装
///
/// `STORE_BACKEND=memory`での起動とテストで使用する。
/// トランザクション内の書き込みはコミット時に1回のロック取得で反映されるため、
/// 他の読み取りからは全部見えるか、何も見えないかのどちらかになる。
#[derive(Clone, Default)]
pub struct EntityStore {
    state: Arc<Mutex<Collections>>,
    counters: Arc<TransactionCounters>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 書籍を登録する
    pub fn add_book(&self, book: Book) {
        self.lock().books.insert(book.id, book);
    }

    /// 利用者を登録する
    pub fn add_borrower(&self, borrower: Borrower) {
        self.lock().borrowers.insert(borrower.id, borrower);
    }

    /// 貸出記録を直接登録する（履歴は更新しない）
    pub fn add_borrowing(&self, borrowing: Borrowing) {
        self.lock().borrowings.push(borrowing);
    }

    /// 保存されている貸出記録の件数
    pub fn borrowing_count(&self) -> usize {
        self.lock().borrowings.len()
    }

    /// 開始されたトランザクションの数
    pub fn transactions_begun(&self) -> usize {
        self.counters.begun.load(Ordering::SeqCst)
    }

    /// コミットされたトランザクションの数
    pub fn transactions_committed(&self) -> usize {
        self.counters.committed.load(Ordering::SeqCst)
    }

    /// 中止されたトランザクションの数
    pub fn transactions_aborted(&self) -> usize {
        self.counters.aborted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityStoreTrait for EntityStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        self.counters.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryTransaction::new(
            self.state.clone(),
            self.counters.clone(),
        )))
    }

    async fn find_book(&self, book_id: BookId) -> Result<Option<Book>> {
        Ok(self.lock().books.get(&book_id).cloned())
    }

    async fn find_borrower(&self, borrower_id: BorrowerId) -> Result<Option<Borrower>> {
        Ok(self.lock().borrowers.get(&borrower_id).cloned())
    }

    async fn find_borrowing(&self, borrowing_id: BorrowingId) -> Result<Option<Borrowing>> {
        Ok(self.lock().borrowing(borrowing_id).cloned())
    }

    async fn find_borrowings(&self, filter: BorrowingFilter) -> Result<Vec<BorrowingDetails>> {
        let state = self.lock();
        Ok(state
            .borrowings
            .iter()
            .filter(|b| filter.status.is_none_or(|status| b.status == status))
            .map(|b| state.details(b))
            .collect())
    }

    async fn update_borrowing(
        &self,
        borrowing_id: BorrowingId,
        patch: &BorrowingPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Borrowing>> {
        let mut state = self.lock();
        let Some(stored) = state.borrowing_mut(borrowing_id) else {
            return Ok(None);
        };

        *stored = patch.apply(stored.clone(), updated_at);
        Ok(Some(stored.clone()))
    }

    async fn save_borrowing(&self, borrowing: &Borrowing) -> Result<Option<Borrowing>> {
        let mut state = self.lock();
        let Some(stored) = state.borrowing_mut(borrowing.id) else {
            return Ok(None);
        };

        *stored = borrowing.clone();
        Ok(Some(stored.clone()))
    }
}
