use thiserror::Error;

/// ストレージポートのエラー
///
/// ドメイン上の拒否（書籍が貸出中、など）はエラーではなく
/// 各ポートの結果型（`OpenLoanOutcome`など）で返す。
/// ここに含まれるのはストレージ自体の失敗のみ。
#[derive(Debug, Error)]
pub enum StoreError {
    /// 一時的なトランザクション競合（シリアライズ失敗・デッドロック）
    ///
    /// 再試行すれば成功する可能性がある。
    #[error("transaction conflict")]
    Conflict,

    /// バックエンドの障害
    #[error("storage backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Backend(Box::new(err))
    }

    /// 再試行の対象か
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict)
    }
}

/// ストレージポートの Result型
pub type Result<T> = std::result::Result<T, StoreError>;
