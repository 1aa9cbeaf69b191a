use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/library";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// 設定・接続のエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 環境変数の値が不正
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    /// データベースに接続できない
    #[error("failed to connect to database")]
    Connect(#[source] sqlx::Error),

    /// マイグレーションの失敗
    #[error("failed to run migrations")]
    Migrate(#[source] sqlx::migrate::MigrateError),
}

/// ストレージ接続の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

impl StoreConfig {
    /// 環境変数から読み込む
    ///
    /// - `DATABASE_URL`
    /// - `DATABASE_MAX_CONNECTIONS`
    /// - `DATABASE_ACQUIRE_TIMEOUT_SECS`
    ///
    /// 未設定の項目は既定値を使う。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から読み込む（テスト用に環境変数を差し替えられる）
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => parse_positive("DATABASE_MAX_CONNECTIONS", value)?,
            None => defaults.max_connections,
        };

        let acquire_timeout = match lookup("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse_positive(
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                value,
            )?),
            None => defaults.acquire_timeout,
        };

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout,
        })
    }

    /// コネクションプールを作成し、マイグレーションを適用する
    pub async fn connect(&self) -> Result<PgPool, ConfigError> {
        tracing::info!(
            max_connections = self.max_connections,
            "connecting to database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(&self.database_url)
            .await
            .map_err(ConfigError::Connect)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(ConfigError::Migrate)?;

        Ok(pool)
    }
}

fn parse_positive<T>(name: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}
