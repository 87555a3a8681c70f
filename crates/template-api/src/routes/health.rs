//! 헬스 체크 endpoint.
//!
//! - `GET /health`: 배포 정보 (응답 캐시 대상)
//! - `GET /health/ready`: 의존성(저장소, 캐시) 상태

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// 항상 "ok"
    pub status: String,
    /// 서버 시작 시각 (ISO 8601)
    pub deployed_at: String,
    /// API 버전
    pub version: String,
}

/// 준비 상태 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadinessResponse {
    /// 전체 상태 ("healthy" | "degraded" | "unhealthy")
    pub status: String,
    /// API 버전
    pub version: String,
    /// 서버 업타임(초)
    pub uptime_secs: i64,
    /// 개별 컴포넌트 상태
    pub components: ComponentHealth,
}

/// 개별 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    /// 계정 저장소
    pub database: ComponentStatus,
    /// 응답 캐시
    pub cache: ComponentStatus,
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    /// 상태 ("up" | "down" | "disabled")
    pub status: String,
    /// 백엔드 이름 등 추가 정보
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    fn up(message: impl Into<String>) -> Self {
        Self {
            status: "up".to_string(),
            message: Some(message.into()),
        }
    }

    fn down(message: impl Into<String>) -> Self {
        Self {
            status: "down".to_string(),
            message: Some(message.into()),
        }
    }

    fn disabled() -> Self {
        Self {
            status: "disabled".to_string(),
            message: None,
        }
    }
}

/// 배포 정보 (liveness).
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "서버 동작 중", body = HealthResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        deployed_at: state.started_at.to_rfc3339(),
        version: state.version.clone(),
    })
}

/// 의존성 상태 (readiness).
///
/// 저장소 장애는 503, 캐시 장애는 degraded(200)로 처리합니다.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "system",
    responses(
        (status = 200, description = "요청 처리 가능", body = ReadinessResponse),
        (status = 503, description = "저장소 장애", body = ReadinessResponse)
    )
)]
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut overall_status = "healthy";
    let mut status_code = StatusCode::OK;

    let backend = state.accounts.store().backend();
    let database = if state.is_store_healthy().await {
        ComponentStatus::up(backend)
    } else {
        overall_status = "unhealthy";
        status_code = StatusCode::SERVICE_UNAVAILABLE;
        ComponentStatus::down(backend)
    };

    let cache = if !state.cache.is_enabled() {
        ComponentStatus::disabled()
    } else if state.cache.health_check().await {
        ComponentStatus::up(state.cache.backend_name())
    } else {
        // 캐시 장애는 요청 처리에 치명적이지 않음
        if overall_status == "healthy" {
            overall_status = "degraded";
        }
        ComponentStatus::down(state.cache.backend_name())
    };

    let response = ReadinessResponse {
        status: overall_status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        components: ComponentHealth { database, cache },
    };

    (status_code, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/health/ready", get(health_ready))
            .with_state(Arc::new(create_test_state()))
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(health.status, "ok");
        assert!(chrono::DateTime::parse_from_rfc3339(&health.deployed_at).is_ok());
        assert!(!health.version.is_empty());
    }

    #[tokio::test]
    async fn test_health_ready() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let ready: ReadinessResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(ready.status, "healthy");
        assert_eq!(ready.components.database.message.as_deref(), Some("memory"));
        assert_eq!(ready.components.cache.status, "up");
    }
}
