use crate::application::ServiceDependencies;
use crate::domain::{
    self,
    book::Book,
    loan::{Loan, OpenLoan, ReturnedLoan},
    user::User,
    value_objects::*,
};
use crate::ports::{
    BookCatalog, BookListing, CloseLoanOutcome, InsertUserOutcome, LoanLedger, OpenLoanOutcome,
    Result, StoreError, UserRepository,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// 全テーブル
///
/// `usernames` と `open_loans` はそれぞれ一意制約・部分一意インデックスに相当する。
#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    usernames: HashMap<Username, UserId>,
    books: HashMap<BookId, BookListing>,
    loans: HashMap<LoanId, Loan>,
    open_loans: HashMap<BookId, LoanId>,
}

impl Tables {
    fn listing(&self, book_id: BookId) -> Option<BookListing> {
        self.books.get(&book_id).cloned()
    }
}

/// インメモリのストレージ実装
///
/// 全テーブルを1つのMutexで保護する。各ポート操作はロックを1回だけ取得して
/// 完結するため、PostgreSQL実装のトランザクションと同じくアトミックに実行され、
/// 同じ制約（一意性・参照整合性・書籍ごとの貸出中1件）が成り立つ。
/// ロック中に`.await`はしない。
#[derive(Default)]
pub struct Database {
    tables: Mutex<Tables>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// このデータベース1つで全ポートを満たす依存関係を組み立てる
    pub fn service_dependencies(self: &Arc<Self>) -> ServiceDependencies {
        ServiceDependencies {
            users: self.clone(),
            books: self.clone(),
            loans: self.clone(),
        }
    }

    /// books.available のキャッシュと貸出状態が一致しない書籍を返す
    ///
    /// テストでの不変条件の検証に使う。
    pub fn inconsistent_books(&self) -> Result<Vec<BookId>> {
        let tables = self.lock()?;
        let loans: Vec<&Loan> = tables.loans.values().collect();

        Ok(tables
            .books
            .iter()
            .filter(|(book_id, listing)| {
                listing.available != domain::loan::is_available(**book_id, loans.iter().copied())
            })
            .map(|(book_id, _)| *book_id)
            .collect())
    }

    /// 書籍ごとの貸出中の貸出件数
    pub fn open_loan_count(&self, book_id: BookId) -> Result<usize> {
        let tables = self.lock()?;
        Ok(tables
            .loans
            .values()
            .filter(|loan| loan.book_id() == book_id && loan.is_open())
            .count())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::backend(std::io::Error::other("in-memory store lock poisoned")))
    }
}

#[async_trait]
impl UserRepository for Database {
    async fn insert(&self, user: &User) -> Result<InsertUserOutcome> {
        let mut tables = self.lock()?;

        if tables.usernames.contains_key(&user.username) {
            return Ok(InsertUserOutcome::UsernameTaken);
        }

        tables.usernames.insert(user.username.clone(), user.user_id);
        tables.users.insert(user.user_id, user.clone());
        Ok(InsertUserOutcome::Inserted)
    }

    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &PasswordHash,
    ) -> Result<bool> {
        let mut tables = self.lock()?;

        match tables.users.get_mut(&user_id) {
            Some(user) => {
                user.password_hash = password_hash.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.lock()?.users.get(&user_id).cloned())
    }

    async fn find_by_username(&self, username: &Username) -> Result<Option<User>> {
        let tables = self.lock()?;
        Ok(tables
            .usernames
            .get(username)
            .and_then(|user_id| tables.users.get(user_id))
            .cloned())
    }
}

#[async_trait]
impl BookCatalog for Database {
    async fn insert(&self, book: &Book) -> Result<()> {
        let mut tables = self.lock()?;
        tables.books.insert(
            book.book_id,
            BookListing {
                book: book.clone(),
                available: true,
            },
        );
        Ok(())
    }

    async fn get_by_id(&self, book_id: BookId) -> Result<Option<BookListing>> {
        Ok(self.lock()?.listing(book_id))
    }

    async fn list(&self, page: Page) -> Result<Vec<BookListing>> {
        let tables = self.lock()?;

        let mut listings: Vec<BookListing> = tables.books.values().cloned().collect();
        listings.sort_by(|a, b| {
            a.book
                .title
                .as_str()
                .cmp(b.book.title.as_str())
                .then_with(|| a.book.book_id.value().cmp(&b.book.book_id.value()))
        });

        Ok(listings
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }
}

#[async_trait]
impl LoanLedger for Database {
    async fn open(&self, loan: &OpenLoan) -> Result<OpenLoanOutcome> {
        let mut tables = self.lock()?;

        if !tables.books.contains_key(&loan.book_id) {
            return Ok(OpenLoanOutcome::BookMissing);
        }
        if !tables.users.contains_key(&loan.user_id) {
            return Ok(OpenLoanOutcome::UserMissing);
        }
        if tables.open_loans.contains_key(&loan.book_id) {
            return Ok(OpenLoanOutcome::BookOnLoan);
        }

        tables.open_loans.insert(loan.book_id, loan.loan_id);
        tables.loans.insert(loan.loan_id, Loan::Open(loan.clone()));
        if let Some(listing) = tables.books.get_mut(&loan.book_id) {
            listing.available = false;
        }

        Ok(OpenLoanOutcome::Opened)
    }

    async fn close(&self, loan_id: LoanId, return_date: NaiveDate) -> Result<CloseLoanOutcome> {
        let mut tables = self.lock()?;

        let returned = match tables.loans.get(&loan_id) {
            None => return Ok(CloseLoanOutcome::LoanMissing),
            Some(Loan::Returned(_)) => return Ok(CloseLoanOutcome::AlreadyClosed),
            Some(Loan::Open(open)) => ReturnedLoan {
                core: open.core.clone(),
                return_date,
            },
        };

        let book_id = returned.book_id;
        tables.open_loans.remove(&book_id);
        tables
            .loans
            .insert(loan_id, Loan::Returned(returned.clone()));
        if let Some(listing) = tables.books.get_mut(&book_id) {
            listing.available = true;
        }

        Ok(CloseLoanOutcome::Closed(returned))
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        Ok(self.lock()?.loans.get(&loan_id).cloned())
    }

    async fn has_open_loan(&self, book_id: BookId) -> Result<bool> {
        Ok(self.lock()?.open_loans.contains_key(&book_id))
    }

    async fn find_by_user_id(&self, user_id: UserId, page: Page) -> Result<Vec<Loan>> {
        let tables = self.lock()?;

        let mut loans: Vec<Loan> = tables
            .loans
            .values()
            .filter(|loan| loan.user_id() == user_id)
            .cloned()
            .collect();
        loans.sort_by(|a, b| {
            b.core()
                .loan_date
                .cmp(&a.core().loan_date)
                .then_with(|| a.loan_id().value().cmp(&b.loan_id().value()))
        });

        Ok(loans
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect())
    }
}
