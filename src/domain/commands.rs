use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId, UserId};

/// コマンド：書籍を貸し出す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLoan {
    pub user_id: UserId,
    pub book_id: BookId,
    pub loan_date: NaiveDate,
}

impl IssueLoan {
    /// 本日付で貸し出す
    pub fn today(user_id: UserId, book_id: BookId) -> Self {
        Self {
            user_id,
            book_id,
            loan_date: Utc::now().date_naive(),
        }
    }
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLoan {
    pub loan_id: LoanId,
    pub return_date: NaiveDate,
}

impl ReturnLoan {
    /// 本日付で返却する
    pub fn today(loan_id: LoanId) -> Self {
        Self {
            loan_id,
            return_date: Utc::now().date_naive(),
        }
    }
}

/// コマンド：利用者を登録する
///
/// パスワードのハッシュ化は呼び出し側の責務。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub password_hash: String,
}

/// コマンド：認証情報を更新する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotateCredential {
    pub user_id: UserId,
    pub password_hash: String,
}

/// コマンド：書籍をカタログに登録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddBook {
    pub title: String,
    pub author: String,
}
