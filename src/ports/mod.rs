pub mod book_catalog;
pub mod errors;
pub mod loan_ledger;
pub mod user_repository;

pub use book_catalog::*;
pub use errors::*;
pub use loan_ledger::*;
pub use user_repository::*;
