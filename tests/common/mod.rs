#![allow(dead_code)]

use rusty_library_ledger::adapters::memory::InMemoryDatabase;
use rusty_library_ledger::application::ServiceDependencies;
use rusty_library_ledger::config::StoreConfig;
use rusty_library_ledger::telemetry;
use sqlx::PgPool;
use std::sync::Arc;

/// テスト用データベースプールを作成し、マイグレーションを実行
///
/// DATABASE_URL環境変数からデータベースURLを取得する。
/// 本番と同じ`StoreConfig::connect`を使うため、マイグレーションも同じものが適用される。
pub async fn create_test_pool() -> PgPool {
    telemetry::init_tracing(telemetry::DEFAULT_FILTER);

    let config = StoreConfig::from_env().expect("Invalid database configuration");
    let config = StoreConfig {
        max_connections: config.max_connections.max(20),
        ..config
    };

    config
        .connect()
        .await
        .expect("Failed to connect to test database")
}

/// インメモリのストレージで依存関係を組み立てる
pub fn in_memory_deps() -> (Arc<InMemoryDatabase>, ServiceDependencies) {
    telemetry::init_tracing(telemetry::DEFAULT_FILTER);

    let db = Arc::new(InMemoryDatabase::new());
    let deps = db.service_dependencies();
    (db, deps)
}
