use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 貸出ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanId(Uuid);

impl LoanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for LoanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 書籍ID - usersテーブルと同様にアプリケーション側で採番する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 利用者ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// 空文字列（前後の空白を除いて）
    Blank(&'static str),
    /// 文字数が上限を超えている
    TooLong { field: &'static str, max: usize },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::Blank(field) => write!(f, "{} must not be blank", field),
            ValueError::TooLong { field, max } => {
                write!(f, "{} must be at most {} characters", field, max)
            }
        }
    }
}

/// 文字列項目の最大文字数（VARCHAR(255)の列と一致させる）
pub const MAX_TEXT_CHARS: usize = 255;

fn within_limit(field: &'static str, value: &str) -> Result<(), ValueError> {
    if value.chars().count() > MAX_TEXT_CHARS {
        return Err(ValueError::TooLong {
            field,
            max: MAX_TEXT_CHARS,
        });
    }
    Ok(())
}

fn non_blank(field: &'static str, value: String) -> Result<String, ValueError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValueError::Blank(field));
    }
    within_limit(field, trimmed)?;
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_string())
    }
}

/// ユーザー名
///
/// 不変条件：前後の空白を除いて空でないこと。
/// 一意性はストレージの一意制約で保証する（値オブジェクトでは判定できない）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        non_blank("username", value).map(Self)
    }
}

impl TryFrom<&str> for Username {
    type Error = ValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

/// 認証情報のハッシュ値
///
/// ハッシュ化はこのクレートの外で行う。ここでは空でないことだけを保証する。
/// `Debug`出力ではハッシュ値を伏せる。
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

impl TryFrom<String> for PasswordHash {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(ValueError::Blank("password_hash"));
        }
        within_limit("password_hash", &value)?;
        // ハッシュ文字列はそのまま保持する（トリムしない）
        Ok(Self(value))
    }
}

impl TryFrom<&str> for PasswordHash {
    type Error = ValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl From<PasswordHash> for String {
    fn from(value: PasswordHash) -> Self {
        value.0
    }
}

/// 書名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Title(String);

impl Title {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Title {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        non_blank("title", value).map(Self)
    }
}

impl TryFrom<&str> for Title {
    type Error = ValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl From<Title> for String {
    fn from(value: Title) -> Self {
        value.0
    }
}

/// 著者名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Author(String);

impl Author {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Author {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        non_blank("author", value).map(Self)
    }
}

impl TryFrom<&str> for Author {
    type Error = ValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl From<Author> for String {
    fn from(value: Author) -> Self {
        value.0
    }
}

/// 一覧取得のページ指定
///
/// 既定値は offset 0 / limit 10。limit は 1..=100 に丸める。
///
/// デシリアライズも`Page::new`を通るため、丸めを回避できない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPage")]
pub struct Page {
    offset: u32,
    limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(offset: u32, limit: u32) -> Self {
        Self {
            offset,
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(default)]
    offset: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    Page::DEFAULT_LIMIT
}

impl From<RawPage> for Page {
    fn from(raw: RawPage) -> Self {
        Page::new(raw.offset, raw.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loan_id_creation() {
        let id1 = LoanId::new();
        let id2 = LoanId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_book_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = BookId::from_uuid(uuid);
        assert_eq!(id.value(), uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_username_is_trimmed() {
        let username = Username::try_from("  alice ").unwrap();
        assert_eq!(username.as_str(), "alice");
    }

    #[test]
    fn test_username_rejects_blank() {
        assert_eq!(
            Username::try_from("   ").unwrap_err(),
            ValueError::Blank("username")
        );
    }

    #[test]
    fn test_password_hash_is_not_trimmed_and_not_printed() {
        let hash = PasswordHash::try_from("$2b$12$abc ").unwrap();
        assert_eq!(hash.as_str(), "$2b$12$abc ");
        assert!(!format!("{:?}", hash).contains("abc"));
    }

    #[test]
    fn test_title_and_author_reject_blank() {
        assert!(Title::try_from("").is_err());
        assert!(Author::try_from("\t").is_err());
        assert_eq!(Title::try_from("Dune").unwrap().as_str(), "Dune");
    }

    #[test]
    fn test_username_deserialize_validates() {
        let ok: Username = serde_json::from_str("\"bob\"").unwrap();
        assert_eq!(ok.as_str(), "bob");
        assert!(serde_json::from_str::<Username>("\"  \"").is_err());
    }

    #[test]
    fn test_page_limit_is_clamped() {
        assert_eq!(Page::new(0, 0).limit(), 1);
        assert_eq!(Page::new(5, 1_000).limit(), Page::MAX_LIMIT);
        assert_eq!(Page::new(5, 1_000).offset(), 5);
        assert_eq!(Page::default(), Page::new(0, 10));
    }

    #[test]
    fn test_page_deserialize_goes_through_clamp() {
        let zero: Page = serde_json::from_str(r#"{"offset":0,"limit":0}"#).unwrap();
        assert_eq!(zero.limit(), 1);

        let huge: Page = serde_json::from_str(r#"{"offset":3,"limit":5000}"#).unwrap();
        assert_eq!(huge, Page::new(3, Page::MAX_LIMIT));

        let defaults: Page = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, Page::default());
    }

    #[test]
    fn test_text_length_limit_boundary() {
        let at_limit = "a".repeat(MAX_TEXT_CHARS);
        let over_limit = "a".repeat(MAX_TEXT_CHARS + 1);

        assert!(Title::try_from(at_limit.as_str()).is_ok());
        assert_eq!(
            Title::try_from(over_limit.as_str()).unwrap_err(),
            ValueError::TooLong {
                field: "title",
                max: MAX_TEXT_CHARS
            }
        );
        assert!(Username::try_from(over_limit.as_str()).is_err());
        assert!(Author::try_from(over_limit.as_str()).is_err());
        assert!(PasswordHash::try_from(over_limit.as_str()).is_err());
    }

    #[test]
    fn test_text_length_counts_characters_not_bytes() {
        // 3バイト文字255文字は列に収まる
        let kana = "あ".repeat(MAX_TEXT_CHARS);
        assert!(Author::try_from(kana.as_str()).is_ok());

        // 前後の空白は数えない
        let padded = format!("  {}  ", "b".repeat(MAX_TEXT_CHARS));
        assert_eq!(
            Username::try_from(padded).unwrap().as_str().len(),
            MAX_TEXT_CHARS
        );
    }
}
