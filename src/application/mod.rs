pub mod catalog;
mod errors;
pub mod loan;
mod retry;

pub use errors::{LedgerError, Result};

use crate::ports::{BookCatalog, LoanLedger, UserRepository};
use std::sync::Arc;

/// サービスの依存関係
///
/// ストレージへのハンドルを明示的に渡す。グローバルな接続は持たない。
/// 振る舞いは持たず、各サービス関数の第1引数として渡される。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub users: Arc<dyn UserRepository>,
    pub books: Arc<dyn BookCatalog>,
    pub loans: Arc<dyn LoanLedger>,
}
