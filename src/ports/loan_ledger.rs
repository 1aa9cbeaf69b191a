use crate::domain::{
    loan::{Loan, OpenLoan, ReturnedLoan},
    value_objects::*,
};
use async_trait::async_trait;
use chrono::NaiveDate;

use super::Result;

/// 貸出登録の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenLoanOutcome {
    Opened,
    /// 書籍に貸出中の貸出が既に存在する
    BookOnLoan,
    UserMissing,
    BookMissing,
}

/// 返却登録の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseLoanOutcome {
    Closed(ReturnedLoan),
    /// 既に返却済み（同時に返却された場合を含む）
    AlreadyClosed,
    LoanMissing,
}

/// 貸出台帳ポート
///
/// loansテーブルへのアクセスを抽象化する。
/// `open`と`close`はそれぞれ1つのアトミックなトランザクションとして実行され、
/// books.available のキャッシュも同じトランザクション内で更新される。
#[async_trait]
pub trait LoanLedger: Send + Sync {
    /// 貸出を登録する
    ///
    /// 1トランザクションで以下を行う：
    /// 1. 書籍の存在確認（行ロック）
    /// 2. 利用者の存在確認
    /// 3. 貸出中の貸出が無いことの確認
    /// 4. 貸出の挿入
    /// 5. books.available = false
    ///
    /// 同じ書籍への同時貸出では、成功するのは1件のみ。
    async fn open(&self, loan: &OpenLoan) -> Result<OpenLoanOutcome>;

    /// 返却を登録する
    ///
    /// return_date が NULL の場合のみ更新し、同じトランザクションで
    /// books.available = true にする。
    async fn close(&self, loan_id: LoanId, return_date: NaiveDate) -> Result<CloseLoanOutcome>;

    /// IDで貸出を取得する
    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// 書籍に貸出中の貸出が存在するか
    ///
    /// 貸出可否の正となる判定。キャッシュ列は参照しない。
    async fn has_open_loan(&self, book_id: BookId) -> Result<bool>;

    /// 利用者の貸出を新しい順に取得する
    async fn find_by_user_id(&self, user_id: UserId, page: Page) -> Result<Vec<Loan>>;
}
