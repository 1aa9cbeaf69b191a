use serde::{Deserialize, Serialize};

use super::{Author, BookId, RegistrationError, Title};

/// Book集約
///
/// 貸出可否（available）は持たない。貸出状態から導出される値であり、
/// 書籍側で独立に設定できてはならない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub title: Title,
    pub author: Author,
}

/// 純粋関数：書籍をカタログに登録する
pub fn catalog_book(title: String, author: String) -> Result<Book, RegistrationError> {
    Ok(Book {
        book_id: BookId::new(),
        title: Title::try_from(title)?,
        author: Author::try_from(author)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_book_success() {
        let book = catalog_book("Dune".to_string(), "Frank Herbert".to_string()).unwrap();
        assert_eq!(book.title.as_str(), "Dune");
        assert_eq!(book.author.as_str(), "Frank Herbert");
    }

    #[test]
    fn test_catalog_book_rejects_blank_author() {
        assert!(catalog_book("Dune".to_string(), "".to_string()).is_err());
    }
}
