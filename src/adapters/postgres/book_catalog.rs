use crate::domain::{book::Book, value_objects::*};
use crate::ports::book_catalog::{BookCatalog as BookCatalogTrait, BookListing};
use crate::ports::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::errors::{classify, invalid_data};

/// booksテーブルの行をBookListingに変換する
fn map_row_to_listing(row: &PgRow) -> Result<BookListing> {
    let title: String = row.try_get("title").map_err(classify)?;
    let author: String = row.try_get("author").map_err(classify)?;

    Ok(BookListing {
        book: Book {
            book_id: BookId::from_uuid(row.try_get("id").map_err(classify)?),
            title: Title::try_from(title).map_err(invalid_data)?,
            author: Author::try_from(author).map_err(invalid_data)?,
        },
        available: row.try_get("available").map_err(classify)?,
    })
}

/// BookCatalogのPostgreSQL実装
///
/// available列は読み取りのみ。書き込みは`LoanLedger`のトランザクション内で行う。
pub struct BookCatalog {
    pool: PgPool,
}

impl BookCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookCatalogTrait for BookCatalog {
    async fn insert(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (id, title, author, available)
            VALUES ($1, $2, $3, TRUE)
            "#,
        )
        .bind(book.book_id.value())
        .bind(book.title.as_str())
        .bind(book.author.as_str())
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        Ok(())
    }

    async fn get_by_id(&self, book_id: BookId) -> Result<Option<BookListing>> {
        let row = sqlx::query("SELECT id, title, author, available FROM books WHERE id = $1")
            .bind(book_id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

        row.as_ref().map(map_row_to_listing).transpose()
    }

    /// 書名順（同名はID順）でページを取得
    async fn list(&self, page: Page) -> Result<Vec<BookListing>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, author, available
            FROM books
            ORDER BY title ASC, id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(page.limit()))
        .bind(i64::from(page.offset()))
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        rows.iter().map(map_row_to_listing).collect()
    }
}
