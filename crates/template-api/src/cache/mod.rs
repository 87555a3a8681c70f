//! HTTP 응답 캐시.
//!
//! GET 응답 본문을 메모리 또는 Redis에 저장합니다.
//! 캐시 장애는 요청을 실패시키지 않으며 경고 로그만 남깁니다.

mod key;
mod layer;
mod memory;
mod redis;

pub use key::{namespace_prefix, request_key};
pub use layer::{response_cache, CacheScope};
pub use memory::MemoryBackend;
pub use self::redis::RedisBackend;

use std::sync::Arc;

use axum::http::Method;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use template_core::{CacheBackendKind, CacheConfig};
use tracing::info;

/// 캐시 에러.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Redis 명령 실패
    #[error("Redis 에러: {0}")]
    Redis(#[from] ::redis::RedisError),

    /// 저장 형식 직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정 누락
    #[error("캐시 설정 에러: {0}")]
    Config(String),
}

/// 캐시에 저장되는 응답.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// HTTP 상태 코드
    pub status: u16,
    /// Content-Type 헤더
    pub content_type: Option<String>,
    /// base64로 인코딩된 본문
    pub body: String,
}

impl CachedResponse {
    /// 본문 바이트로 생성합니다.
    pub fn new(status: u16, content_type: Option<String>, body: &[u8]) -> Self {
        Self {
            status,
            content_type,
            body: STANDARD.encode(body),
        }
    }

    /// 본문 바이트를 복원합니다.
    pub fn body_bytes(&self) -> Option<Vec<u8>> {
        STANDARD.decode(&self.body).ok()
    }
}

enum Backend {
    Memory(MemoryBackend),
    Redis(RedisBackend),
}

struct Inner {
    backend: Backend,
    prefix: String,
    expiration: Option<u64>,
    enabled: bool,
}

/// 응답 캐시 핸들.
///
/// 복제 비용이 낮으며 모든 복제본이 같은 저장소를 공유합니다.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("backend", &self.backend_name())
            .field("prefix", &self.inner.prefix)
            .field("expiration", &self.inner.expiration)
            .field("enabled", &self.inner.enabled)
            .finish()
    }
}

impl ResponseCache {
    /// 설정에 따라 백엔드를 연결합니다.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let backend = match config.backend {
            CacheBackendKind::InMemory => Backend::Memory(memory_backend(config)),
            CacheBackendKind::Redis => {
                let url = config.connection_string.as_deref().ok_or_else(|| {
                    CacheError::Config("redis backend requires connection_string".into())
                })?;
                Backend::Redis(RedisBackend::connect(url).await?)
            }
        };

        let cache = Self::with_backend(backend, config);
        info!(
            backend = cache.backend_name(),
            prefix = %config.prefix,
            enabled = config.enabled,
            "Response cache initialized"
        );
        Ok(cache)
    }

    /// 메모리 백엔드로 생성합니다. `config.backend`는 무시됩니다.
    pub fn in_memory(config: &CacheConfig) -> Self {
        Self::with_backend(Backend::Memory(memory_backend(config)), config)
    }

    fn with_backend(backend: Backend, config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                prefix: config.prefix.clone(),
                expiration: config.expiration,
                enabled: config.enabled,
            }),
        }
    }

    /// 캐시 활성화 여부.
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled
    }

    /// 키 접두사.
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// 만료 시간 (초).
    pub fn expiration(&self) -> Option<u64> {
        self.inner.expiration
    }

    /// 백엔드 이름.
    pub fn backend_name(&self) -> &'static str {
        match self.inner.backend {
            Backend::Memory(_) => "in-memory",
            Backend::Redis(_) => "redis",
        }
    }

    /// 요청에 대한 캐시 키.
    pub fn key_for(
        &self,
        namespace: &str,
        method: &Method,
        path: &str,
        query: Option<&str>,
    ) -> String {
        request_key(&self.inner.prefix, namespace, method, path, query)
    }

    /// 저장된 응답을 조회합니다.
    pub async fn get(&self, key: &str) -> Result<Option<CachedResponse>, CacheError> {
        let raw = match &self.inner.backend {
            Backend::Memory(memory) => memory.get(key).await,
            Backend::Redis(redis) => redis.get(key).await?,
        };

        raw.map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(CacheError::from)
    }

    /// 응답을 저장합니다. 설정된 만료 시간이 적용됩니다.
    pub async fn put(&self, key: &str, response: &CachedResponse) -> Result<(), CacheError> {
        let raw = serde_json::to_string(response)?;
        match &self.inner.backend {
            Backend::Memory(memory) => memory.set(key, raw).await,
            Backend::Redis(redis) => redis.set(key, raw, self.inner.expiration).await?,
        }
        Ok(())
    }

    /// 네임스페이스(없으면 접두사 전체)의 키를 삭제하고 삭제 수를 반환합니다.
    pub async fn clear(&self, namespace: Option<&str>) -> Result<usize, CacheError> {
        let prefix = namespace_prefix(&self.inner.prefix, namespace);
        let cleared = match &self.inner.backend {
            Backend::Memory(memory) => memory.clear_prefix(&prefix).await,
            Backend::Redis(redis) => redis.clear_prefix(&prefix).await?,
        };

        info!(prefix = %prefix, cleared, "Response cache cleared");
        Ok(cleared)
    }

    /// 백엔드 통계.
    pub async fn info(&self) -> Result<Value, CacheError> {
        match &self.inner.backend {
            Backend::Memory(memory) => Ok(json!({
                "backend": "in-memory",
                "entries": memory.len().await,
            })),
            Backend::Redis(redis) => Ok(Value::Object(redis.info().await?)),
        }
    }

    /// 백엔드 상태를 확인합니다.
    pub async fn health_check(&self) -> bool {
        match &self.inner.backend {
            Backend::Memory(_) => true,
            Backend::Redis(redis) => redis.health_check().await.unwrap_or(false),
        }
    }
}

fn memory_backend(config: &CacheConfig) -> MemoryBackend {
    MemoryBackend::new(config.expiration, config.max_entries)
}

#[cfg(test)]
pub(crate) fn test_cache(enabled: bool) -> ResponseCache {
    ResponseCache::in_memory(&CacheConfig {
        enabled,
        ..CacheConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_and_clear() {
        let cache = test_cache(true);
        let key = cache.key_for("system", &Method::GET, "/health", None);
        let response = CachedResponse::new(200, Some("application/json".into()), b"{\"ok\":1}");

        cache.put(&key, &response).await.unwrap();
        let cached = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(cached, response);
        assert_eq!(cached.body_bytes().unwrap(), b"{\"ok\":1}");

        assert_eq!(cache.clear(Some("accounts")).await.unwrap(), 0);
        assert_eq!(cache.clear(Some("system")).await.unwrap(), 1);
        assert!(cache.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_info_in_memory() {
        let cache = test_cache(true);
        cache
            .put("jobs-api:system:get:/health:", &CachedResponse::new(200, None, b""))
            .await
            .unwrap();

        let info = cache.info().await.unwrap();
        assert_eq!(info["backend"], "in-memory");
        assert_eq!(info["entries"], 1);
    }

    #[tokio::test]
    async fn test_redis_backend_requires_url() {
        let config = CacheConfig {
            backend: CacheBackendKind::Redis,
            ..CacheConfig::default()
        };
        assert!(matches!(
            ResponseCache::connect(&config).await,
            Err(CacheError::Config(_))
        ));
    }
}
