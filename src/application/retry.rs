use backon::{ConstantBuilder, Retryable};
use std::future::Future;
use std::time::Duration;

use crate::ports::{self, StoreError};

/// 一時的な競合の再試行ポリシー：待たずに1回だけ
fn conflict_retry_policy() -> ConstantBuilder {
    ConstantBuilder::default()
        .with_delay(Duration::ZERO)
        .with_max_times(1)
}

/// ストレージ操作を実行し、一時的な競合の場合のみ1回だけ再試行する
///
/// ドメイン上の拒否（結果型で返るもの）やバックエンド障害は再試行しない。
/// 2回目も競合した場合は `StoreError::Conflict` をそのまま返す。
pub(crate) async fn retry_once<T, F, Fut>(operation: &'static str, attempt: F) -> ports::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ports::Result<T>>,
{
    attempt
        .retry(conflict_retry_policy())
        .when(StoreError::is_retryable)
        .notify(|err: &StoreError, _: Duration| {
            tracing::warn!(operation, error = %err, "transaction conflict, retrying once");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_retry_once_recovers_from_single_conflict() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let result = retry_once("test", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(StoreError::Conflict)
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_once_gives_up_after_second_conflict() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let result: ports::Result<()> = retry_once("test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Conflict)
        })
        .await;

        assert!(matches!(result, Err(StoreError::Conflict)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_once_does_not_retry_backend_errors() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let result: ports::Result<()> = retry_once("test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::backend(std::io::Error::other("boom")))
        })
        .await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
