use crate::domain::{
    loan::{Loan, LoanCore, OpenLoan, ReturnedLoan},
    value_objects::*,
};
use crate::ports::Result;
use crate::ports::loan_ledger::{CloseLoanOutcome, LoanLedger as LoanLedgerTrait, OpenLoanOutcome};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row, error::ErrorKind, postgres::PgRow};
use uuid::Uuid;

use super::errors::{classify, violated_constraint};

/// Partial unique index guarding "one open loan per book".
pub const ONE_OPEN_LOAN_PER_BOOK: &str = "loans_one_open_per_book";
const LOANS_USER_FK: &str = "loans_user_id_fkey";
const LOANS_BOOK_FK: &str = "loans_book_id_fkey";

fn map_row_to_core(row: &PgRow) -> Result<LoanCore> {
    Ok(LoanCore {
        loan_id: LoanId::from_uuid(row.try_get("id").map_err(classify)?),
        user_id: UserId::from_uuid(row.try_get("user_id").map_err(classify)?),
        book_id: BookId::from_uuid(row.try_get("book_id").map_err(classify)?),
        loan_date: row.try_get("loan_date").map_err(classify)?,
    })
}

fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let return_date: Option<NaiveDate> = row.try_get("return_date").map_err(classify)?;
    Ok(Loan::from_parts(map_row_to_core(row)?, return_date))
}

/// Outcome for a constraint violation raised by the loan INSERT.
///
/// The explicit checks in `open` normally catch these first; the
/// constraints decide when a concurrent transaction slipped in between.
fn outcome_for_violation(kind: ErrorKind, constraint: &str) -> Option<OpenLoanOutcome> {
    match (kind, constraint) {
        (ErrorKind::UniqueViolation, ONE_OPEN_LOAN_PER_BOOK) => Some(OpenLoanOutcome::BookOnLoan),
        (ErrorKind::ForeignKeyViolation, LOANS_USER_FK) => Some(OpenLoanOutcome::UserMissing),
        (ErrorKind::ForeignKeyViolation, LOANS_BOOK_FK) => Some(OpenLoanOutcome::BookMissing),
        _ => None,
    }
}

/// PostgreSQL implementation of LoanLedger
///
/// Each write runs in a single transaction at READ COMMITTED. Both `open`
/// and `close` lock the book row first, so writers for the same book are
/// serialized and always acquire locks in the same order (book, then loan).
/// The partial unique index on open loans is the last line of defence.
pub struct LoanLedger {
    pool: PgPool,
}

impl LoanLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanLedgerTrait for LoanLedger {
    async fn open(&self, loan: &OpenLoan) -> Result<OpenLoanOutcome> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        // 1. Lock the book row; concurrent issuers for this book queue here
        let book_found = sqlx::query("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(loan.book_id.value())
            .fetch_optional(&mut *tx)
            .await
            .map_err(classify)?
            .is_some();

        if !book_found {
            return Ok(OpenLoanOutcome::BookMissing);
        }

        // 2. Referenced user must exist
        let user_found: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(loan.user_id.value())
                .fetch_one(&mut *tx)
                .await
                .map_err(classify)?;

        if !user_found {
            return Ok(OpenLoanOutcome::UserMissing);
        }

        // 3. No open loan for the book. Under the row lock this statement
        //    sees every loan committed by earlier lock holders.
        let on_loan: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM loans WHERE book_id = $1 AND return_date IS NULL)",
        )
        .bind(loan.book_id.value())
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        if on_loan {
            return Ok(OpenLoanOutcome::BookOnLoan);
        }

        // 4. Insert the loan
        let inserted = sqlx::query(
            r#"
            INSERT INTO loans (id, user_id, book_id, loan_date, return_date)
            VALUES ($1, $2, $3, $4, NULL)
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.user_id.value())
        .bind(loan.book_id.value())
        .bind(loan.loan_date)
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            // The transaction is aborted either way; dropping `tx` rolls it back.
            if let Some(outcome) = violated_constraint(&err)
                .and_then(|(kind, constraint)| outcome_for_violation(kind, &constraint))
            {
                return Ok(outcome);
            }
            return Err(classify(err));
        }

        // 5. Keep the availability cache in step with the loan
        sqlx::query("UPDATE books SET available = FALSE WHERE id = $1")
            .bind(loan.book_id.value())
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        tx.commit().await.map_err(classify)?;
        Ok(OpenLoanOutcome::Opened)
    }

    async fn close(&self, loan_id: LoanId, return_date: NaiveDate) -> Result<CloseLoanOutcome> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        // book_id never changes, so it is safe to read before locking
        let book_id: Option<Uuid> = sqlx::query_scalar("SELECT book_id FROM loans WHERE id = $1")
            .bind(loan_id.value())
            .fetch_optional(&mut *tx)
            .await
            .map_err(classify)?;

        let Some(book_id) = book_id else {
            return Ok(CloseLoanOutcome::LoanMissing);
        };

        sqlx::query("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        let row = sqlx::query(
            r#"
            UPDATE loans
            SET return_date = $2
            WHERE id = $1 AND return_date IS NULL
            RETURNING id, user_id, book_id, loan_date
            "#,
        )
        .bind(loan_id.value())
        .bind(return_date)
        .fetch_optional(&mut *tx)
        .await
        .map_err(classify)?;

        let Some(row) = row else {
            return Ok(CloseLoanOutcome::AlreadyClosed);
        };
        let core = map_row_to_core(&row)?;

        sqlx::query("UPDATE books SET available = TRUE WHERE id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        tx.commit().await.map_err(classify)?;
        Ok(CloseLoanOutcome::Closed(ReturnedLoan { core, return_date }))
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, book_id, loan_date, return_date
            FROM loans
            WHERE id = $1
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    async fn has_open_loan(&self, book_id: BookId) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM loans WHERE book_id = $1 AND return_date IS NULL)",
        )
        .bind(book_id.value())
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    /// Newest first; loans issued on the same day are ordered by id for a
    /// stable pagination order.
    async fn find_by_user_id(&self, user_id: UserId, page: Page) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_id, loan_date, return_date
            FROM loans
            WHERE user_id = $1
            ORDER BY loan_date DESC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id.value())
        .bind(i64::from(page.limit()))
        .bind(i64::from(page.offset()))
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        rows.iter().map(map_row_to_loan).collect()
    }
}
