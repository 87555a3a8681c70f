//! API 라우트 정의.
//!
//! | 메서드 | 경로 | 인증 |
//! |--------|------|------|
//! | POST | `/signup` | - |
//! | POST | `/login` | - |
//! | GET/PATCH | `/accounts/me` | Bearer JWT |
//! | GET | `/health` | - (응답 캐시, 네임스페이스 `system`) |
//! | GET | `/health/ready` | - |
//! | GET | `/clear-cache` | API 토큰 |
//! | GET | `/cache-info` | API 토큰 |

pub mod accounts;
pub mod health;
pub mod system;

pub use accounts::accounts_router;
pub use health::{
    health_check, health_ready, ComponentHealth, ComponentStatus, HealthResponse,
    ReadinessResponse,
};
pub use system::{system_router, CacheInfoResponse};

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use crate::cache::{response_cache, CacheScope, ResponseCache};
use crate::state::AppState;

/// 시스템 라우트의 캐시 네임스페이스.
pub const SYSTEM_NAMESPACE: &str = "system";

/// 헬스 체크 라우터 생성.
///
/// `/health`만 응답 캐시를 거치며 `/health/ready`는 항상 실제 상태를 확인합니다.
pub fn health_router(cache: ResponseCache) -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route_layer(middleware::from_fn_with_state(
            CacheScope::new(cache, SYSTEM_NAMESPACE),
            response_cache,
        ))
        .route("/health/ready", get(health_ready))
}

/// 전체 API 라우터 생성.
pub fn create_api_router(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .merge(accounts_router())
        .merge(health_router(state.cache.clone()))
        .merge(system_router())
}
