use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId, ReturnLoanError, UserId};

// ============================================================================
// 型安全な状態パターン
// ============================================================================

/// Loan集約の共通フィールド
///
/// 貸出中・返却済みのどちらの状態でも共有されるコアデータ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanCore {
    pub loan_id: LoanId,

    // 他の集約への参照（IDのみ）
    pub user_id: UserId,
    pub book_id: BookId,

    pub loan_date: NaiveDate,
}

/// 貸出中状態
///
/// ビジネスルール：
/// - 1冊の書籍に対して貸出中の貸出は高々1件
/// - 貸出中の間、書籍は貸出不可
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenLoan {
    #[serde(flatten)]
    pub core: LoanCore,
}

impl std::ops::Deref for OpenLoan {
    type Target = LoanCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// 返却済み状態
///
/// ビジネスルール：
/// - return_dateが必須（型で保証）
/// - 以後の変更・削除は不可（履歴として残る）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnedLoan {
    #[serde(flatten)]
    pub core: LoanCore,
    pub return_date: NaiveDate,
}

impl std::ops::Deref for ReturnedLoan {
    type Target = LoanCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// Loan集約
///
/// loansテーブルの1行に対応する。return_date が NULL の行は Open。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Loan {
    Open(OpenLoan),
    Returned(ReturnedLoan),
}

impl Loan {
    /// 永続化された列の値から状態を復元する
    pub fn from_parts(core: LoanCore, return_date: Option<NaiveDate>) -> Self {
        match return_date {
            None => Loan::Open(OpenLoan { core }),
            Some(return_date) => Loan::Returned(ReturnedLoan { core, return_date }),
        }
    }

    pub fn core(&self) -> &LoanCore {
        match self {
            Loan::Open(open) => &open.core,
            Loan::Returned(returned) => &returned.core,
        }
    }

    pub fn loan_id(&self) -> LoanId {
        self.core().loan_id
    }

    pub fn book_id(&self) -> BookId {
        self.core().book_id
    }

    pub fn user_id(&self) -> UserId {
        self.core().user_id
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        match self {
            Loan::Open(_) => None,
            Loan::Returned(returned) => Some(returned.return_date),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Loan::Open(_))
    }
}

/// 純粋関数：書籍を貸し出す
///
/// 書籍が貸出可能かどうかはここでは判定しない。
/// 「貸出中の貸出が存在しない」ことの確認と挿入は、
/// ストレージ側の1トランザクションで行う必要がある。
pub fn issue_loan(user_id: UserId, book_id: BookId, loan_date: NaiveDate) -> OpenLoan {
    OpenLoan {
        core: LoanCore {
            loan_id: LoanId::new(),
            user_id,
            book_id,
            loan_date,
        },
    }
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 返却済みの貸出は返却できない
/// - 返却日は貸出日以降
pub fn return_loan(loan: Loan, return_date: NaiveDate) -> Result<ReturnedLoan, ReturnLoanError> {
    match loan {
        Loan::Open(open) => {
            if return_date < open.loan_date {
                return Err(ReturnLoanError::ReturnBeforeLoanDate);
            }
            Ok(ReturnedLoan {
                core: open.core,
                return_date,
            })
        }
        Loan::Returned(_) => Err(ReturnLoanError::AlreadyReturned),
    }
}

/// 純粋関数：書籍が貸出可能か
///
/// 対象書籍の貸出履歴から、貸出中のものが1件もなければ貸出可能。
pub fn is_available<'a>(book_id: BookId, loans: impl IntoIterator<Item = &'a Loan>) -> bool {
    !loans
        .into_iter()
        .any(|loan| loan.book_id() == book_id && loan.is_open())
}
