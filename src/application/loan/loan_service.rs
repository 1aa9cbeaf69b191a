use crate::domain::{
    self,
    commands::*,
    loan::{Loan, OpenLoan, ReturnedLoan},
    value_objects::*,
};
use crate::ports::{CloseLoanOutcome, OpenLoanOutcome};

use crate::application::{LedgerError, Result, ServiceDependencies, retry::retry_once};

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 利用者が存在すること
/// - 書籍が存在すること
/// - 書籍に貸出中の貸出が無いこと
///
/// # 一貫性保証
///
/// 「貸出中の貸出が無いことの確認」と「貸出の挿入」は
/// `LoanLedger::open` の1トランザクションで実行される。
/// 同じ書籍に対する同時呼び出しのうち成功するのは1件のみで、
/// 残りは`BookUnavailable`になる。
///
/// 一時的なトランザクション競合は1回だけ再試行し、
/// 解消しなければ`Conflict`を返す。
///
/// # 戻り値
/// 作成された貸出（貸出中状態）
#[tracing::instrument(skip_all, fields(user_id = %cmd.user_id, book_id = %cmd.book_id, loan_date = %cmd.loan_date))]
pub async fn issue_loan(deps: &ServiceDependencies, cmd: IssueLoan) -> Result<OpenLoan> {
    // 1. ドメイン層の純粋関数を呼び出し
    let open_loan = domain::loan::issue_loan(cmd.user_id, cmd.book_id, cmd.loan_date);

    // 2. 1トランザクションで確認と登録を行う
    let loans = deps.loans.as_ref();
    let candidate = &open_loan;
    let outcome = retry_once("issue_loan", move || loans.open(candidate)).await?;

    match outcome {
        OpenLoanOutcome::Opened => {
            tracing::info!(loan_id = %open_loan.loan_id, "loan issued");
            Ok(open_loan)
        }
        OpenLoanOutcome::BookOnLoan => {
            tracing::debug!("book already on loan");
            Err(LedgerError::BookUnavailable)
        }
        OpenLoanOutcome::UserMissing => Err(LedgerError::UserNotFound),
        OpenLoanOutcome::BookMissing => Err(LedgerError::BookNotFound),
    }
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 貸出が存在すること
/// - 貸出が返却済みでないこと
/// - 返却日が貸出日以降であること
///
/// 返却の登録と books.available の更新は `LoanLedger::close` の
/// 1トランザクションで行われる。同時に返却された場合、
/// 後から確定した側は`AlreadyReturned`になる。
#[tracing::instrument(skip_all, fields(loan_id = %cmd.loan_id, return_date = %cmd.return_date))]
pub async fn return_loan(deps: &ServiceDependencies, cmd: ReturnLoan) -> Result<ReturnedLoan> {
    // 1. 貸出を取得
    let loan = deps
        .loans
        .get_by_id(cmd.loan_id)
        .await?
        .ok_or(LedgerError::LoanNotFound)?;

    // 2. ドメイン層の純粋関数で検証
    let returned = domain::loan::return_loan(loan, cmd.return_date)?;

    // 3. return_date が NULL の場合のみ更新する
    let loans = deps.loans.as_ref();
    let loan_id = returned.loan_id;
    let return_date = returned.return_date;
    let outcome = retry_once("return_loan", move || loans.close(loan_id, return_date)).await?;

    match outcome {
        CloseLoanOutcome::Closed(returned) => {
            tracing::info!(book_id = %returned.book_id, "loan returned");
            Ok(returned)
        }
        CloseLoanOutcome::AlreadyClosed => Err(LedgerError::AlreadyReturned),
        CloseLoanOutcome::LoanMissing => Err(LedgerError::LoanNotFound),
    }
}

/// 書籍が貸出可能か
///
/// books.available のキャッシュ列ではなく、貸出中の貸出の有無から判定する。
pub async fn is_available(deps: &ServiceDependencies, book_id: BookId) -> Result<bool> {
    if deps.books.get_by_id(book_id).await?.is_none() {
        return Err(LedgerError::BookNotFound);
    }

    let has_open_loan = deps.loans.has_open_loan(book_id).await?;
    Ok(!has_open_loan)
}

/// IDで貸出を取得する
pub async fn get_loan(deps: &ServiceDependencies, loan_id: LoanId) -> Result<Loan> {
    deps.loans
        .get_by_id(loan_id)
        .await?
        .ok_or(LedgerError::LoanNotFound)
}

/// 利用者の貸出履歴を新しい順に取得する
pub async fn list_loans_for_user(
    deps: &ServiceDependencies,
    user_id: UserId,
    page: Page,
) -> Result<Vec<Loan>> {
    if deps.users.get_by_id(user_id).await?.is_none() {
        return Err(LedgerError::UserNotFound);
    }

    Ok(deps.loans.find_by_user_id(user_id, page).await?)
}
