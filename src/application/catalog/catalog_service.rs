use crate::domain::{self, book::Book, commands::*, user::User, value_objects::*};
use crate::ports::{BookListing, InsertUserOutcome};

use crate::application::{LedgerError, Result, ServiceDependencies, retry::retry_once};

/// 利用者を登録する
///
/// ビジネスルール：
/// - ユーザー名・認証情報が空でないこと
/// - ユーザー名が未登録であること（ストレージの一意制約で判定）
#[tracing::instrument(skip_all, fields(username = %cmd.username))]
pub async fn register_user(deps: &ServiceDependencies, cmd: RegisterUser) -> Result<User> {
    let user = domain::user::register_user(cmd.username, cmd.password_hash)?;

    let users = deps.users.as_ref();
    let candidate = &user;
    match retry_once("register_user", move || users.insert(candidate)).await? {
        InsertUserOutcome::Inserted => {
            tracing::info!(user_id = %user.user_id, "user registered");
            Ok(user)
        }
        InsertUserOutcome::UsernameTaken => Err(LedgerError::UsernameTaken),
    }
}

/// 認証情報を更新する
#[tracing::instrument(skip_all, fields(user_id = %cmd.user_id))]
pub async fn rotate_credential(deps: &ServiceDependencies, cmd: RotateCredential) -> Result<User> {
    let user = deps
        .users
        .get_by_id(cmd.user_id)
        .await?
        .ok_or(LedgerError::UserNotFound)?;

    let rotated = domain::user::rotate_credential(&user, cmd.password_hash)?;

    let updated = deps
        .users
        .update_password_hash(rotated.user_id, &rotated.password_hash)
        .await?;
    if !updated {
        return Err(LedgerError::UserNotFound);
    }

    tracing::info!("credential rotated");
    Ok(rotated)
}

/// IDで利用者を取得する
pub async fn get_user(deps: &ServiceDependencies, user_id: UserId) -> Result<User> {
    deps.users
        .get_by_id(user_id)
        .await?
        .ok_or(LedgerError::UserNotFound)
}

/// ユーザー名で利用者を取得する
pub async fn find_user_by_username(deps: &ServiceDependencies, username: &str) -> Result<User> {
    let username = Username::try_from(username)
        .map_err(|e| LedgerError::InvalidInput(e.to_string()))?;

    deps.users
        .find_by_username(&username)
        .await?
        .ok_or(LedgerError::UserNotFound)
}

/// 書籍をカタログに登録する
///
/// 登録直後の書籍は貸出可能。
#[tracing::instrument(skip_all)]
pub async fn add_book(deps: &ServiceDependencies, cmd: AddBook) -> Result<Book> {
    let book = domain::book::catalog_book(cmd.title, cmd.author)?;

    deps.books.insert(&book).await?;

    tracing::info!(book_id = %book.book_id, "book added to catalog");
    Ok(book)
}

/// IDで書籍を取得する
pub async fn get_book(deps: &ServiceDependencies, book_id: BookId) -> Result<BookListing> {
    deps.books
        .get_by_id(book_id)
        .await?
        .ok_or(LedgerError::BookNotFound)
}

/// 書籍一覧を書名順に取得する
pub async fn list_books(deps: &ServiceDependencies, page: Page) -> Result<Vec<BookListing>> {
    Ok(deps.books.list(page).await?)
}
