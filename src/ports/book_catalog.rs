use crate::domain::{book::Book, value_objects::*};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Result;

/// 書籍一覧のエントリ
///
/// `available` は books.available 列（貸出中の貸出が無いことのキャッシュ）。
/// 更新されるのは貸出・返却のトランザクション内のみ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookListing {
    #[serde(flatten)]
    pub book: Book,
    pub available: bool,
}

/// 書籍カタログポート
///
/// booksテーブルへのアクセスを抽象化する。
/// 貸出可否を直接書き換える操作は意図的に持たない。
#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// 書籍を登録する（貸出可能な状態で作成される）
    async fn insert(&self, book: &Book) -> Result<()>;

    /// IDで書籍を取得する
    async fn get_by_id(&self, book_id: BookId) -> Result<Option<BookListing>>;

    /// 書籍一覧を書名順に取得する
    async fn list(&self, page: Page) -> Result<Vec<BookListing>>;
}
