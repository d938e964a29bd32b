use borrowing_service::adapters::postgres::PostgresEntityStore;
use borrowing_service::domain::value_objects::*;
use borrowing_service::domain::{Book, Borrower, BorrowingPatch, borrowing};
use borrowing_service::ports::*;
use chrono::{DateTime, Duration, Timelike, Utc};
use serial_test::serial;
use sqlx::PgPool;

mod common;

// ============================================================================
// テスト用のヘルパー関数
// ============================================================================

/// PostgreSQLのTIMESTAMPTZはマイクロ秒精度のため、比較前に丸める
fn truncate_to_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = dt.nanosecond();
    dt.with_nanosecond(nanos / 1_000 * 1_000).unwrap()
}

async fn cleanup_database(pool: &PgPool) {
    sqlx::query("TRUNCATE TABLE borrowings, borrowers, books CASCADE")
        .execute(pool)
        .await
        .expect("Failed to truncate tables");
}

async fn insert_book(pool: &PgPool, book: &Book) {
    sqlx::query("INSERT INTO books (id, title, description) VALUES ($1, $2, $3)")
        .bind(book.id.value())
        .bind(&book.title)
        .bind(&book.description)
        .execute(pool)
        .await
        .expect("Failed to insert book");
}

async fn insert_borrower(pool: &PgPool, borrower: &Borrower) {
    sqlx::query("INSERT INTO borrowers (id, name, membership_id) VALUES ($1, $2, $3)")
        .bind(borrower.id.value())
        .bind(&borrower.name)
        .bind(&borrower.membership_id)
        .execute(pool)
        .await
        .expect("Failed to insert borrower");
}

/// データベースを空にして書籍と利用者を1件ずつ登録する
async fn setup(pool: &PgPool) -> (PostgresEntityStore, Book, Borrower) {
    cleanup_database(pool).await;

    let book = Book::new("Kindred", "A time travel novel");
    let borrower = Borrower::new("Dana Franklin", "M-1976");
    insert_book(pool, &book).await;
    insert_borrower(pool, &borrower).await;

    (PostgresEntityStore::new(pool.clone()), book, borrower)
}

/// トランザクション経由で貸出記録と履歴を登録する
async fn insert_committed(store: &PostgresEntityStore, record: &borrowing::Borrowing) {
    let mut tx = store.begin().await.unwrap();
    tx.insert_borrowing(record).await.unwrap();
    tx.append_borrow_history(record.borrower_id, record.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();
}

fn new_record(book: &Book, borrower: &Borrower) -> borrowing::Borrowing {
    let now = truncate_to_micros(Utc::now());
    borrowing::open_borrowing(book.id, borrower.id, None, None, None, now)
}

// ============================================================================
// トランザクション
// ============================================================================

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL"]
async fn test_commit_persists_borrowing_and_history() {
    let pool = common::create_test_pool().await;
    let (store, book, borrower) = setup(&pool).await;
    let record = new_record(&book, &borrower);

    let mut tx = store.begin().await.unwrap();
    assert!(tx.find_book(book.id).await.unwrap().is_some());
    assert!(tx.find_borrower(borrower.id).await.unwrap().is_some());
    tx.insert_borrowing(&record).await.unwrap();
    tx.append_borrow_history(borrower.id, record.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let stored = store.find_borrowing(record.id).await.unwrap().unwrap();
    assert_eq!(stored, record);
    let stored_borrower = store.find_borrower(borrower.id).await.unwrap().unwrap();
    assert_eq!(stored_borrower.borrow_history, vec![record.id]);
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL"]
async fn test_abort_discards_all_writes() {
    let pool = common::create_test_pool().await;
    let (store, book, borrower) = setup(&pool).await;
    let record = new_record(&book, &borrower);

    let mut tx = store.begin().await.unwrap();
    tx.insert_borrowing(&record).await.unwrap();
    tx.append_borrow_history(borrower.id, record.id)
        .await
        .unwrap();
    tx.abort().await.unwrap();

    assert!(store.find_borrowing(record.id).await.unwrap().is_none());
    let stored_borrower = store.find_borrower(borrower.id).await.unwrap().unwrap();
    assert!(stored_borrower.borrow_history.is_empty());
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL"]
async fn test_append_history_for_unknown_borrower_fails() {
    let pool = common::create_test_pool().await;
    let (store, _, _) = setup(&pool).await;

    let mut tx = store.begin().await.unwrap();
    let result = tx
        .append_borrow_history(BorrowerId::new(), BorrowingId::new())
        .await;

    assert!(result.is_err());
    tx.abort().await.unwrap();
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL"]
async fn test_delete_and_remove_history_in_one_transaction() {
    let pool = common::create_test_pool().await;
    let (store, book, borrower) = setup(&pool).await;
    let record = new_record(&book, &borrower);

    let mut tx = store.begin().await.unwrap();
    tx.insert_borrowing(&record).await.unwrap();
    tx.append_borrow_history(borrower.id, record.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let deleted = tx.delete_borrowing(record.id).await.unwrap();
    assert_eq!(deleted, Some(record.clone()));
    tx.remove_borrow_history(borrower.id, record.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert!(store.find_borrowing(record.id).await.unwrap().is_none());
    let stored_borrower = store.find_borrower(borrower.id).await.unwrap().unwrap();
    assert!(stored_borrower.borrow_history.is_empty());

    let mut tx = store.begin().await.unwrap();
    assert!(tx.delete_borrowing(record.id).await.unwrap().is_none());
    tx.abort().await.unwrap();
}

// ============================================================================
// 読み取り・単一行の書き込み
// ============================================================================

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL"]
async fn test_find_borrowings_filters_and_enriches() {
    let pool = common::create_test_pool().await;
    let (store, book, borrower) = setup(&pool).await;
    let now = truncate_to_micros(Utc::now());

    let active = borrowing::open_borrowing(book.id, borrower.id, None, None, None, now);
    let returned = borrowing::return_borrowing(
        borrowing::open_borrowing(
            book.id,
            borrower.id,
            None,
            None,
            None,
            now + Duration::seconds(1),
        ),
        now + Duration::seconds(2),
    );
    insert_committed(&store, &active).await;
    insert_committed(&store, &returned).await;

    let all = store
        .find_borrowings(BorrowingFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].borrowing.id, active.id);

    let only_returned = store
        .find_borrowings(BorrowingFilter {
            status: Some(BorrowingStatus::Returned),
        })
        .await
        .unwrap();
    assert_eq!(only_returned.len(), 1);
    let details = &only_returned[0];
    assert_eq!(details.borrowing, returned);
    let book_summary = details.book.as_ref().unwrap();
    assert_eq!(book_summary.title, "Kindred");
    assert_eq!(book_summary.description, "A time travel novel");
    let borrower_summary = details.borrower.as_ref().unwrap();
    assert_eq!(borrower_summary.membership_id, "M-1976");
    assert_eq!(borrower_summary.name, "Dana Franklin");
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL"]
async fn test_update_borrowing_applies_only_patched_fields() {
    let pool = common::create_test_pool().await;
    let (store, book, borrower) = setup(&pool).await;
    let record = new_record(&book, &borrower);
    insert_committed(&store, &record).await;

    let due_date = truncate_to_micros(Utc::now() + Duration::days(21));
    let updated_at = truncate_to_micros(Utc::now());
    let updated = store
        .update_borrowing(
            record.id,
            &BorrowingPatch {
                borrow_date: None,
                due_date: Some(due_date),
            },
            updated_at,
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.due_date, Some(due_date));
    assert_eq!(updated.borrow_date, record.borrow_date);
    assert_eq!(updated.status, BorrowingStatus::Active);
    assert_eq!(updated.updated_at, updated_at);

    let missing = store
        .update_borrowing(BorrowingId::new(), &BorrowingPatch::default(), updated_at)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL"]
async fn test_save_borrowing_overwrites_existing_row() {
    let pool = common::create_test_pool().await;
    let (store, book, borrower) = setup(&pool).await;
    let record = new_record(&book, &borrower);
    insert_committed(&store, &record).await;

    let returned_at = truncate_to_micros(Utc::now() + Duration::minutes(5));
    let returned = borrowing::return_borrowing(record.clone(), returned_at);
    let saved = store.save_borrowing(&returned).await.unwrap();
    assert_eq!(saved, Some(returned.clone()));

    let stored = store.find_borrowing(record.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BorrowingStatus::Returned);
    assert_eq!(stored.return_date, Some(returned_at));
}

#[tokio::test]
#[serial]
#[ignore = "requires DATABASE_URL"]
async fn test_save_borrowing_does_not_insert_deleted_row() {
    let pool = common::create_test_pool().await;
    let (store, book, borrower) = setup(&pool).await;
    let record = new_record(&book, &borrower);
    insert_committed(&store, &record).await;

    let loaded = store.find_borrowing(record.id).await.unwrap().unwrap();

    let mut tx = store.begin().await.unwrap();
    tx.delete_borrowing(record.id).await.unwrap();
    tx.remove_borrow_history(borrower.id, record.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let returned = borrowing::return_borrowing(loaded, truncate_to_micros(Utc::now()));
    let saved = store.save_borrowing(&returned).await.unwrap();

    assert!(saved.is_none());
    assert!(store.find_borrowing(record.id).await.unwrap().is_none());
    let stored_borrower = store.find_borrower(borrower.id).await.unwrap().unwrap();
    assert!(stored_borrower.borrow_history.is_empty());
}
