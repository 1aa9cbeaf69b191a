//! PostgreSQL実装に対する統合テスト
//!
//! 実行には DATABASE_URL で到達できるPostgreSQLが必要：
//! `cargo test -- --ignored`

mod common;

use futures::future::join_all;
use rusty_library_ledger::adapters::postgres::{self, PostgresLoanLedger};
use rusty_library_ledger::application::{
    LedgerError, ServiceDependencies,
    catalog::{add_book, find_user_by_username, get_book, register_user, rotate_credential},
    loan::{is_available, issue_loan, list_loans_for_user, return_loan},
};
use rusty_library_ledger::domain::{book::Book, commands::*, user::User, value_objects::*};
use rusty_library_ledger::ports::{CloseLoanOutcome, LoanLedger, OpenLoanOutcome};
use sqlx::PgPool;
use uuid::Uuid;

async fn setup() -> (PgPool, ServiceDependencies) {
    let pool = common::create_test_pool().await;
    let deps = postgres::service_dependencies(pool.clone());
    (pool, deps)
}

/// 実行ごとに一意なユーザー名
fn unique_name(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

async fn new_user(deps: &ServiceDependencies, prefix: &str) -> User {
    register_user(
        deps,
        RegisterUser {
            username: unique_name(prefix),
            password_hash: "$argon2id$v=19$hash".to_string(),
        },
    )
    .await
    .expect("Failed to register user")
}

async fn new_book(deps: &ServiceDependencies, title: &str) -> Book {
    add_book(
        deps,
        AddBook {
            title: title.to_string(),
            author: "Stanisław Lem".to_string(),
        },
    )
    .await
    .expect("Failed to add book")
}

/// テストデータをクリーンアップ
async fn cleanup(pool: &PgPool, books: &[BookId], users: &[UserId]) {
    let book_ids: Vec<Uuid> = books.iter().map(|b| b.value()).collect();
    let user_ids: Vec<Uuid> = users.iter().map(|u| u.value()).collect();

    sqlx::query("DELETE FROM loans WHERE book_id = ANY($1) OR user_id = ANY($2)")
        .bind(&book_ids)
        .bind(&user_ids)
        .execute(pool)
        .await
        .expect("Failed to cleanup loans");
    sqlx::query("DELETE FROM books WHERE id = ANY($1)")
        .bind(&book_ids)
        .execute(pool)
        .await
        .expect("Failed to cleanup books");
    sqlx::query("DELETE FROM users WHERE id = ANY($1)")
        .bind(&user_ids)
        .execute(pool)
        .await
        .expect("Failed to cleanup users");
}

async fn open_loan_count(pool: &PgPool, book_id: BookId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE book_id = $1 AND return_date IS NULL")
        .bind(book_id.value())
        .fetch_one(pool)
        .await
        .expect("Failed to count open loans")
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_scenario_loan_handover_between_users() {
    let (pool, deps) = setup().await;
    let u1 = new_user(&deps, "u1").await;
    let u2 = new_user(&deps, "u2").await;
    let b1 = new_book(&deps, "Solaris").await;

    let loan = issue_loan(&deps, IssueLoan::today(u1.user_id, b1.book_id))
        .await
        .unwrap();
    assert!(!is_available(&deps, b1.book_id).await.unwrap());
    assert!(!get_book(&deps, b1.book_id).await.unwrap().available);

    let rejected = issue_loan(&deps, IssueLoan::today(u2.user_id, b1.book_id)).await;
    assert!(matches!(rejected, Err(LedgerError::BookUnavailable)));

    return_loan(&deps, ReturnLoan::today(loan.loan_id))
        .await
        .unwrap();
    assert!(is_available(&deps, b1.book_id).await.unwrap());
    assert!(get_book(&deps, b1.book_id).await.unwrap().available);

    let again = return_loan(&deps, ReturnLoan::today(loan.loan_id)).await;
    assert!(matches!(again, Err(LedgerError::AlreadyReturned)));

    issue_loan(&deps, IssueLoan::today(u2.user_id, b1.book_id))
        .await
        .unwrap();
    assert_eq!(open_loan_count(&pool, b1.book_id).await, 1);

    let history = list_loans_for_user(&deps, u1.user_id, Page::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert!(!history[0].is_open());

    cleanup(&pool, &[b1.book_id], &[u1.user_id, u2.user_id]).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_unknown_references_fail_not_found() {
    let (pool, deps) = setup().await;
    let user = new_user(&deps, "u1").await;
    let book = new_book(&deps, "The Cyberiad").await;

    let unknown_user = issue_loan(&deps, IssueLoan::today(UserId::new(), book.book_id)).await;
    let unknown_book = issue_loan(&deps, IssueLoan::today(user.user_id, BookId::new())).await;
    let unknown_loan = return_loan(&deps, ReturnLoan::today(LoanId::new())).await;

    assert!(matches!(unknown_user, Err(LedgerError::UserNotFound)));
    assert!(matches!(unknown_book, Err(LedgerError::BookNotFound)));
    assert!(matches!(unknown_loan, Err(LedgerError::LoanNotFound)));
    assert!(matches!(
        is_available(&deps, BookId::new()).await,
        Err(LedgerError::BookNotFound)
    ));
    assert_eq!(open_loan_count(&pool, book.book_id).await, 0);

    cleanup(&pool, &[book.book_id], &[user.user_id]).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_ledger_outcomes() {
    let (pool, deps) = setup().await;
    let ledger = PostgresLoanLedger::new(pool.clone());
    let user = new_user(&deps, "u1").await;
    let book = new_book(&deps, "Fiasco").await;

    let first = rusty_library_ledger::domain::loan::issue_loan(
        user.user_id,
        book.book_id,
        chrono::Utc::now().date_naive(),
    );
    let second = rusty_library_ledger::domain::loan::issue_loan(
        user.user_id,
        book.book_id,
        chrono::Utc::now().date_naive(),
    );

    assert_eq!(ledger.open(&first).await.unwrap(), OpenLoanOutcome::Opened);
    assert_eq!(ledger.open(&second).await.unwrap(), OpenLoanOutcome::BookOnLoan);
    assert!(ledger.has_open_loan(book.book_id).await.unwrap());

    let closed = ledger
        .close(first.loan_id, first.loan_date)
        .await
        .unwrap();
    assert!(matches!(closed, CloseLoanOutcome::Closed(ref r) if r.loan_id == first.loan_id));
    assert_eq!(
        ledger.close(first.loan_id, first.loan_date).await.unwrap(),
        CloseLoanOutcome::AlreadyClosed
    );
    assert_eq!(
        ledger.close(LoanId::new(), first.loan_date).await.unwrap(),
        CloseLoanOutcome::LoanMissing
    );
    assert!(!ledger.has_open_loan(book.book_id).await.unwrap());

    cleanup(&pool, &[book.book_id], &[user.user_id]).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_register_user_username_taken_and_rotate() {
    let (pool, deps) = setup().await;
    let user = new_user(&deps, "reader").await;

    let duplicate = register_user(
        &deps,
        RegisterUser {
            username: user.username.as_str().to_string(),
            password_hash: "other".to_string(),
        },
    )
    .await;
    assert!(matches!(duplicate, Err(LedgerError::UsernameTaken)));

    let rotated = rotate_credential(
        &deps,
        RotateCredential {
            user_id: user.user_id,
            password_hash: "rotated".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(rotated.password_hash.as_str(), "rotated");

    let found = find_user_by_username(&deps, user.username.as_str())
        .await
        .unwrap();
    assert_eq!(found, rotated);

    cleanup(&pool, &[], &[user.user_id]).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_issue_on_same_book_only_one_succeeds() {
    let (pool, deps) = setup().await;
    let book = new_book(&deps, "His Master's Voice").await;

    let mut users = Vec::new();
    for _ in 0..50 {
        users.push(new_user(&deps, "racer").await);
    }

    let handles = users.iter().map(|user| {
        let deps = deps.clone();
        let cmd = IssueLoan::today(user.user_id, book.book_id);
        tokio::spawn(async move { issue_loan(&deps, cmd).await })
    });

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let unavailable = results
        .iter()
        .filter(|r| matches!(r, Err(LedgerError::BookUnavailable)))
        .count();

    assert_eq!(succeeded, 1);
    assert_eq!(unavailable, 49);
    assert_eq!(open_loan_count(&pool, book.book_id).await, 1);
    assert!(!get_book(&deps, book.book_id).await.unwrap().available);

    let user_ids: Vec<UserId> = users.iter().map(|u| u.user_id).collect();
    cleanup(&pool, &[book.book_id], &user_ids).await;
}
