//! PostgreSQL 연결 풀과 마이그레이션.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::ConnectOptions;
use template_core::DatabaseConfig;
use tracing::info;

/// 워크스페이스 루트의 `migrations/` 디렉토리.
static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// 데이터베이스 에러.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// 연결 또는 쿼리 실패
    #[error("데이터베이스 에러: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// 마이그레이션 실패
    #[error("마이그레이션 에러: {0}")]
    Migration(#[from] MigrateError),
}

/// 데이터베이스 연결 풀 래퍼.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 설정으로 연결 풀을 생성합니다.
    ///
    /// 최대 연결 수는 `pool_size + max_overflow`이며 `pool_size`만큼은 유지합니다.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        info!(
            host = %config.hostname,
            port = config.port,
            database = %config.database,
            "Connecting to database..."
        );

        let mut options = PgConnectOptions::new()
            .host(&config.hostname)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(config.password.expose_secret());
        if !config.echo {
            options = options.disable_statement_logging();
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .min_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .max_lifetime(config.max_lifetime())
            .test_before_acquire(config.pool_pre_ping)
            .connect_with(options)
            .await?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// 내부 연결 풀을 반환합니다.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 적용되지 않은 마이그레이션을 모두 실행합니다.
    pub async fn migrate(&self) -> Result<(), DbError> {
        info!("Running database migrations...");
        MIGRATOR.run(&self.pool).await?;
        info!("Migrations completed successfully");
        Ok(())
    }

    /// 가장 최근에 적용된 마이그레이션 하나를 되돌립니다.
    ///
    /// 되돌린 버전을 반환하며, 적용된 마이그레이션이 없으면 `None`입니다.
    pub async fn downgrade(&self) -> Result<Option<i64>, DbError> {
        let versions: Vec<i64> = sqlx::query_scalar(
            "SELECT version FROM _sqlx_migrations WHERE success ORDER BY version DESC LIMIT 2",
        )
        .fetch_all(&self.pool)
        .await?;

        let Some(&latest) = versions.first() else {
            info!("No applied migrations to revert");
            return Ok(None);
        };
        let target = versions.get(1).copied().unwrap_or(0);

        info!(version = latest, target, "Reverting migration...");
        MIGRATOR.undo(&self.pool, target).await?;
        info!(version = latest, "Migration reverted");

        Ok(Some(latest))
    }
}
