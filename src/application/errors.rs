use thiserror::Error;

use crate::domain::{RegistrationError, ReturnLoanError};
use crate::ports::StoreError;

/// 貸出台帳アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LedgerError {
    /// 利用者が存在しない
    #[error("User not found")]
    UserNotFound,

    /// 書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 貸出が存在しない
    #[error("Loan not found")]
    LoanNotFound,

    /// 書籍が貸出中
    #[error("Book is not available for loan")]
    BookUnavailable,

    /// 既に返却済み
    #[error("Loan has already been returned")]
    AlreadyReturned,

    /// ユーザー名が既に使われている
    #[error("Username is already registered")]
    UsernameTaken,

    /// 入力値が不正
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 再試行後もトランザクション競合が解消しなかった
    #[error("Transaction conflict, please retry")]
    Conflict,

    /// ストレージの障害
    #[error("Storage error")]
    Store(#[source] StoreError),
}

impl LedgerError {
    /// 参照先（利用者・書籍・貸出）が存在しないエラーか
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::UserNotFound | LedgerError::BookNotFound | LedgerError::LoanNotFound
        )
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => LedgerError::Conflict,
            other => LedgerError::Store(other),
        }
    }
}

impl From<ReturnLoanError> for LedgerError {
    fn from(err: ReturnLoanError) -> Self {
        match err {
            ReturnLoanError::AlreadyReturned => LedgerError::AlreadyReturned,
            ReturnLoanError::ReturnBeforeLoanDate => {
                LedgerError::InvalidInput("return date precedes loan date".to_string())
            }
        }
    }
}

impl From<RegistrationError> for LedgerError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::InvalidValue(e) => LedgerError::InvalidInput(e.to_string()),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LedgerError>;
