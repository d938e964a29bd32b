use crate::domain::{
    Book, Borrower, Borrowing,
    value_objects::{BookId, BorrowerId, BorrowingId},
};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// トランザクション（Unit of Work）ポート
///
/// このハンドル上で行った書き込みは、`commit`までは他の読み取りから見えず、
/// `abort`またはdropで完全に破棄される。
///
/// `commit`と`abort`はハンドルを消費するため、終了後の再利用は型で防がれる。
/// 終了処理自体が失敗した場合も、ハンドルのdropで資源は解放される。
#[async_trait]
pub trait Transaction: Send {
    /// トランザクション内で書籍を取得する
    async fn find_book(&mut self, book_id: BookId) -> Result<Option<Book>>;

    /// トランザクション内で利用者を取得する
    async fn find_borrower(&mut self, borrower_id: BorrowerId) -> Result<Option<Borrower>>;

    /// 新しい貸出記録を挿入する
    async fn insert_borrowing(&mut self, borrowing: &Borrowing) -> Result<()>;

    /// 利用者の貸出履歴の末尾に貸出記録IDを追加する
    ///
    /// ストレージ層で不可分な追記として実行されること。
    /// 利用者が存在しない場合はエラー。
    async fn append_borrow_history(
        &mut self,
        borrower_id: BorrowerId,
        borrowing_id: BorrowingId,
    ) -> Result<()>;

    /// 貸出記録を削除する
    ///
    /// 削除した記録を返す。存在しない場合はNone。
    async fn delete_borrowing(&mut self, borrowing_id: BorrowingId) -> Result<Option<Borrowing>>;

    /// 利用者の貸出履歴から貸出記録IDを取り除く
    async fn remove_borrow_history(
        &mut self,
        borrower_id: BorrowerId,
        borrowing_id: BorrowingId,
    ) -> Result<()>;

    /// すべての書き込みを確定する
    async fn commit(self: Box<Self>) -> Result<()>;

    /// すべての書き込みを破棄する
    async fn abort(self: Box<Self>) -> Result<()>;
}
