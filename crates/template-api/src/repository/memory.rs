//! 메모리 기반 계정 저장소.
//!
//! 데이터베이스 없이 실행하거나 테스트할 때 사용합니다.
//! 프로세스가 종료되면 데이터가 사라집니다.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use template_core::{User, UserUpdate};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, UserStore};

/// 메모리 기반 [`UserStore`].
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    /// 빈 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 계정 수.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: &User) -> Result<User, StoreError> {
        // 쓰기 락 안에서 중복 확인과 삽입을 함께 수행
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) || users.contains_key(&user.id) {
            return Err(StoreError::Duplicate);
        }

        let now = Utc::now();
        let stored = User {
            created_at: now,
            updated_at: now,
            ..user.clone()
        };
        users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: Uuid, changes: &UserUpdate) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            user.apply(changes);
            user.clone()
        }))
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
