//! Users Repository
//!
//! PostgreSQL `users` 테이블 연산을 담당합니다.

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use template_core::{User, UserUpdate};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{StoreError, UserStore};

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, hashed_password, created_at, updated_at";

/// `users` 테이블 쿼리 모음.
pub struct UserRepository;

impl UserRepository {
    /// 이메일로 조회.
    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(executor)
        .await
    }

    /// ID로 조회.
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<User>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// 계정 삽입. 생성/수정 시각은 DB 기본값을 사용합니다.
    pub async fn insert<'e, E>(executor: E, user: &User) -> Result<User, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, first_name, last_name, hashed_password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.hashed_password)
        .fetch_one(executor)
        .await
    }

    /// 부분 수정. `updated_at`은 트리거가 갱신합니다.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        changes: &UserUpdate,
    ) -> Result<Option<User>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.first_name.as_deref())
        .bind(changes.last_name.as_deref())
        .fetch_optional(executor)
        .await
    }
}

/// PostgreSQL 기반 [`UserStore`].
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// 연결 풀로 저장소를 생성합니다.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(UserRepository::find_by_email(&self.pool, email).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(UserRepository::find_by_id(&self.pool, id).await?)
    }

    async fn insert(&self, user: &User) -> Result<User, StoreError> {
        // 실패 시 커밋 전에 반환되므로 트랜잭션은 drop되며 롤백됨
        let mut tx = self.pool.begin().await?;

        let inserted = match UserRepository::insert(&mut *tx, user).await {
            Ok(inserted) => inserted,
            Err(e) if is_unique_violation(&e) => {
                debug!(user_id = %user.id, "Unique constraint violated on insert");
                return Err(StoreError::Duplicate);
            }
            Err(e) => {
                warn!(error = %e, "Failed to insert user");
                return Err(e.into());
            }
        };

        tx.commit().await?;
        Ok(inserted)
    }

    async fn update(&self, id: Uuid, changes: &UserUpdate) -> Result<Option<User>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let updated = UserRepository::update(&mut *tx, id, changes).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
