//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! Arc로 래핑되어 여러 요청 간에 공유됩니다. 생성 이후 모든 필드는 읽기 전용입니다.

use std::sync::Arc;

use crate::auth::{ApiToken, AuthProvider, TokenService};
use crate::cache::ResponseCache;
use crate::services::AccountService;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 계정 서비스
    pub accounts: AccountService,

    /// 액세스 토큰 발급/검증기
    pub tokens: Arc<TokenService>,

    /// 시스템 엔드포인트용 API 토큰
    pub api_token: Arc<ApiToken>,

    /// 응답 캐시
    pub cache: ResponseCache,

    /// 서버 시작 시각
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    ///
    /// # Arguments
    ///
    /// * `accounts` - 계정 서비스 (토큰 서비스를 공유해야 함)
    /// * `tokens` - 액세스 토큰 검증기
    /// * `api_token` - 정적 API 토큰
    /// * `cache` - 응답 캐시
    pub fn new(
        accounts: AccountService,
        tokens: Arc<TokenService>,
        api_token: ApiToken,
        cache: ResponseCache,
    ) -> Self {
        Self {
            accounts,
            tokens,
            api_token: Arc::new(api_token),
            cache,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 업타임(초) 반환.
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// 계정 저장소 상태 확인.
    pub async fn is_store_healthy(&self) -> bool {
        self.accounts.store().is_healthy().await
    }
}

impl AuthProvider for AppState {
    fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn api_token(&self) -> &ApiToken {
        &self.api_token
    }
}

/// 테스트용 상태: 메모리 저장소, 낮은 해싱 비용, 캐시 활성화.
///
/// API 토큰은 `"test-api-token"`, 토큰 비밀 키는 `"test-secret"`입니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use crate::auth::PasswordHasher;
    use crate::repository::MemoryUserStore;
    use secrecy::SecretString;
    use template_core::{CacheConfig, PasswordConfig};

    let tokens = Arc::new(
        TokenService::new(b"test-secret", "HS256", 60, true)
            .expect("valid test token settings"),
    );
    let hasher = PasswordHasher::new(&PasswordConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .expect("valid test hashing params");
    let accounts = AccountService::new(Arc::new(MemoryUserStore::new()), hasher, tokens.clone());
    let cache = ResponseCache::in_memory(&CacheConfig {
        enabled: true,
        ..CacheConfig::default()
    });

    AppState::new(
        accounts,
        tokens,
        ApiToken::new(&SecretString::new("test-api-token".into())),
        cache,
    )
}
