//! 시스템 endpoint (API 토큰 필요).
//!
//! - `GET /clear-cache?namespace=`: 응답 캐시 삭제
//! - `GET /cache-info`: 캐시 설정 및 백엔드 통계

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::auth::ApiTokenAuth;
use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 캐시 삭제 쿼리.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ClearCacheQuery {
    /// 삭제할 네임스페이스 (없으면 전체)
    pub namespace: Option<String>,
}

/// 캐시 정보 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CacheInfoResponse {
    /// 키 접두사
    pub prefix: String,
    /// 캐시 활성화 여부
    pub enabled: bool,
    /// 만료 시간 (초)
    pub expiration: Option<u64>,
    /// 백엔드 통계
    #[schema(value_type = Object)]
    pub cache_info: Value,
}

fn cache_failure(e: crate::cache::CacheError) -> ApiError {
    error!(error = %e, "Cache backend operation failed");
    ApiErrorResponse::internal()
}

/// 응답 캐시 삭제.
///
/// 삭제된 키 수를 반환합니다.
#[utoipa::path(
    get,
    path = "/clear-cache",
    tag = "system",
    params(ClearCacheQuery),
    security(("api_token" = [])),
    responses(
        (status = 200, description = "삭제된 키 수", body = usize),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    )
)]
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
    _: ApiTokenAuth,
    Query(query): Query<ClearCacheQuery>,
) -> ApiResult<Json<usize>> {
    let cleared = state
        .cache
        .clear(query.namespace.as_deref())
        .await
        .map_err(cache_failure)?;
    Ok(Json(cleared))
}

/// 캐시 설정 및 백엔드 통계.
#[utoipa::path(
    get,
    path = "/cache-info",
    tag = "system",
    security(("api_token" = [])),
    responses(
        (status = 200, description = "캐시 정보", body = CacheInfoResponse),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    )
)]
pub async fn cache_info(
    State(state): State<Arc<AppState>>,
    _: ApiTokenAuth,
) -> ApiResult<Json<CacheInfoResponse>> {
    let cache_info = state.cache.info().await.map_err(cache_failure)?;

    Ok(Json(CacheInfoResponse {
        prefix: state.cache.prefix().to_string(),
        enabled: state.cache.is_enabled(),
        expiration: state.cache.expiration(),
        cache_info,
    }))
}

/// 시스템 라우터 생성.
pub fn system_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clear-cache", get(clear_cache))
        .route("/cache-info", get(cache_info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachedResponse;
    use crate::state::create_test_state;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn get_with_token(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_clear_cache_namespace() {
        let state = Arc::new(create_test_state());
        let entry = CachedResponse::new(200, None, b"{}");
        state
            .cache
            .put("jobs-api:system:get:/health:", &entry)
            .await
            .unwrap();
        state
            .cache
            .put("jobs-api:other:get:/x:", &entry)
            .await
            .unwrap();

        let response = system_router()
            .with_state(state.clone())
            .oneshot(get_with_token(
                "/clear-cache?namespace=system",
                "test-api-token",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"1");
        assert_eq!(state.cache.info().await.unwrap()["entries"], 1);
    }

    #[tokio::test]
    async fn test_cache_info() {
        let response = system_router()
            .with_state(Arc::new(create_test_state()))
            .oneshot(get_with_token("/cache-info", "test-api-token"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let info: CacheInfoResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(info.prefix, "jobs-api");
        assert!(info.enabled);
        assert_eq!(info.expiration, None);
        assert_eq!(info.cache_info["backend"], "in-memory");
    }

    #[tokio::test]
    async fn test_wrong_api_token() {
        let response = system_router()
            .with_state(Arc::new(create_test_state()))
            .oneshot(get_with_token("/cache-info", "nope"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
