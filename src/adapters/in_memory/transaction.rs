use crate::domain::{
    Book, Borrower, Borrowing,
    value_objects::{BookId, BorrowerId, BorrowingId},
};
use crate::ports::transaction::{Result, Transaction};
use async_trait::async_trait;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, PoisonError};

use super::entity_store::{Collections, InMemoryStoreError, TransactionCounters};

/// トランザクション内で保留中の書き込み
#[derive(Debug, Clone)]
enum StagedWrite {
    InsertBorrowing(Borrowing),
    AppendHistory {
        borrower_id: BorrowerId,
        borrowing_id: BorrowingId,
    },
    DeleteBorrowing(BorrowingId),
    RemoveHistory {
        borrower_id: BorrowerId,
        borrowing_id: BorrowingId,
    },
}

impl StagedWrite {
    fn apply(&self, collections: &mut Collections) -> Result<()> {
        match self {
            StagedWrite::InsertBorrowing(borrowing) => {
                if collections.borrowing(borrowing.id).is_some() {
                    return Err(InMemoryStoreError::DuplicateBorrowing(borrowing.id).into());
                }
                collections.borrowings.push(borrowing.clone());
            }
            StagedWrite::AppendHistory {
                borrower_id,
                borrowing_id,
            } => {
                let borrower = collections
                    .borrowers
                    .get_mut(borrower_id)
                    .ok_or(InMemoryStoreError::BorrowerNotFound(*borrower_id))?;
                borrower.record_borrowing(*borrowing_id);
            }
            StagedWrite::DeleteBorrowing(borrowing_id) => {
                collections.borrowings.retain(|b| b.id != *borrowing_id);
            }
            StagedWrite::RemoveHistory {
                borrower_id,
                borrowing_id,
            } => {
                // 利用者が既に存在しなければ取り除くものはない
                if let Some(borrower) = collections.borrowers.get_mut(borrower_id) {
                    borrower.forget_borrowing(*borrowing_id);
                }
            }
        }
        Ok(())
    }
}

/// インメモリのトランザクション
///
/// 書き込みは保留リストに積まれ、コミット時にまとめて反映される。
/// 読み取りはコミット済みの状態に保留中の書き込みを重ねた状態を見る。
pub struct InMemoryTransaction {
    state: Arc<Mutex<Collections>>,
    counters: Arc<TransactionCounters>,
    staged: Vec<StagedWrite>,
}

impl InMemoryTransaction {
    pub(super) fn new(state: Arc<Mutex<Collections>>, counters: Arc<TransactionCounters>) -> Self {
        Self {
            state,
            counters,
            staged: Vec::new(),
        }
    }

    /// コミット済みの状態に保留中の書き込みを適用したスナップショット
    fn snapshot(&self) -> Result<Collections> {
        let mut view = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for write in &self.staged {
            write.apply(&mut view)?;
        }
        Ok(view)
    }

    /// 書き込みを検証してから保留リストに積む
    fn stage(&mut self, write: StagedWrite) -> Result<()> {
        let mut view = self.snapshot()?;
        write.apply(&mut view)?;
        self.staged.push(write);
        Ok(())
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn find_book(&mut self, book_id: BookId) -> Result<Option<Book>> {
        Ok(self.snapshot()?.books.remove(&book_id))
    }

    async fn find_borrower(&mut self, borrower_id: BorrowerId) -> Result<Option<Borrower>> {
        Ok(self.snapshot()?.borrowers.remove(&borrower_id))
    }

    async fn insert_borrowing(&mut self, borrowing: &Borrowing) -> Result<()> {
        self.stage(StagedWrite::InsertBorrowing(borrowing.clone()))
    }

    async fn append_borrow_history(
        &mut self,
        borrower_id: BorrowerId,
        borrowing_id: BorrowingId,
    ) -> Result<()> {
        self.stage(StagedWrite::AppendHistory {
            borrower_id,
            borrowing_id,
        })
    }

    async fn delete_borrowing(&mut self, borrowing_id: BorrowingId) -> Result<Option<Borrowing>> {
        let existing = self.snapshot()?.borrowing(borrowing_id).cloned();
        if existing.is_some() {
            self.stage(StagedWrite::DeleteBorrowing(borrowing_id))?;
        }
        Ok(existing)
    }

    async fn remove_borrow_history(
        &mut self,
        borrower_id: BorrowerId,
        borrowing_id: BorrowingId,
    ) -> Result<()> {
        self.stage(StagedWrite::RemoveHistory {
            borrower_id,
            borrowing_id,
        })
    }

    /// 保留中の書き込みを1回のロック取得で反映する
    ///
    /// 途中で失敗した場合はコミット済みの状態を変更しない。
    async fn commit(self: Box<Self>) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = state.clone();
        for write in &self.staged {
            write.apply(&mut next)?;
        }
        *state = next;
        drop(state);

        self.counters.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<()> {
        self.counters.aborted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
