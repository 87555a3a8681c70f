//! 계정 저장소.
//!
//! 데이터베이스 접근 로직을 서비스 계층에서 분리합니다.
//! SQL은 `UserRepository`의 static methods에 모여 있고,
//! 서비스는 [`UserStore`] 트레이트를 통해서만 저장소를 사용합니다.

pub mod memory;
pub mod users;

pub use memory::MemoryUserStore;
pub use users::{PgUserStore, UserRepository};

use async_trait::async_trait;
use template_core::{User, UserUpdate};
use uuid::Uuid;

/// 저장소 에러.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 이메일 유일성 제약 위반
    #[error("이미 존재하는 이메일입니다")]
    Duplicate,

    /// 데이터베이스 에러
    #[error("데이터베이스 에러: {0}")]
    Database(#[from] sqlx::Error),
}

/// 계정 저장소 인터페이스.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 이메일로 계정을 조회합니다 (대소문자 구분).
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// ID로 계정을 조회합니다.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// 새 계정을 저장합니다. 이메일이 이미 있으면 [`StoreError::Duplicate`].
    async fn insert(&self, user: &User) -> Result<User, StoreError>;

    /// 값이 있는 필드만 수정합니다. 계정이 없으면 `None`.
    async fn update(&self, id: Uuid, changes: &UserUpdate) -> Result<Option<User>, StoreError>;

    /// 저장소가 요청을 처리할 수 있는지 확인합니다.
    async fn is_healthy(&self) -> bool;

    /// 백엔드 이름 (health 응답용).
    fn backend(&self) -> &'static str;
}
