pub mod book_catalog;
mod errors;
pub mod loan_ledger;
pub mod user_repository;

use crate::application::ServiceDependencies;
use sqlx::PgPool;
use std::sync::Arc;

// パブリックに型を再エクスポート
pub use book_catalog::BookCatalog as PostgresBookCatalog;
pub use loan_ledger::LoanLedger as PostgresLoanLedger;
pub use user_repository::UserRepository as PostgresUserRepository;

/// 1つのコネクションプールを共有する PostgreSQL 実装で依存関係を組み立てる
pub fn service_dependencies(pool: PgPool) -> ServiceDependencies {
    ServiceDependencies {
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        books: Arc::new(PostgresBookCatalog::new(pool.clone())),
        loans: Arc::new(PostgresLoanLedger::new(pool)),
    }
}
