//! 응답 캐시 미들웨어.
//!
//! 다음 조건을 모두 만족하는 요청만 캐시합니다:
//! - 캐시가 활성화됨
//! - `GET` 요청
//! - `Authorization` 헤더 없음
//! - `Cache-Control: no-store` 아님
//!
//! `Cache-Control: no-cache`는 조회를 건너뛰되 새 응답은 저장합니다.
//! 200 응답만 저장되며, 응답에는 `x-cache: HIT|MISS` 헤더가 붙습니다.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::{CachedResponse, ResponseCache};

/// 응답 캐시 여부 헤더.
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// 이보다 큰 본문은 저장하지 않습니다.
const MAX_CACHED_BODY: usize = 1024 * 1024;

/// 미들웨어 상태: 캐시 핸들과 라우트 그룹 네임스페이스.
#[derive(Debug, Clone)]
pub struct CacheScope {
    cache: ResponseCache,
    namespace: &'static str,
}

impl CacheScope {
    /// 네임스페이스에 묶인 캐시 범위를 생성합니다.
    pub fn new(cache: ResponseCache, namespace: &'static str) -> Self {
        Self { cache, namespace }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Directives {
    no_store: bool,
    no_cache: bool,
}

fn request_directives(request: &Request) -> Directives {
    let mut directives = Directives::default();
    for value in request.headers().get_all(CACHE_CONTROL) {
        let Ok(value) = value.to_str() else { continue };
        for directive in value.split(',').map(|d| d.trim().to_ascii_lowercase()) {
            match directive.as_str() {
                "no-store" => directives.no_store = true,
                "no-cache" => directives.no_cache = true,
                _ => {}
            }
        }
    }
    directives
}

fn is_cacheable(cache: &ResponseCache, request: &Request) -> bool {
    cache.is_enabled()
        && request.method() == Method::GET
        && !request.headers().contains_key(AUTHORIZATION)
}

fn mark(mut response: Response, status: &'static str) -> Response {
    response
        .headers_mut()
        .insert(X_CACHE, HeaderValue::from_static(status));
    response
}

fn replay(cached: &CachedResponse) -> Option<Response> {
    let status = StatusCode::from_u16(cached.status).ok()?;
    let body = cached.body_bytes()?;

    let mut response = (status, Body::from(body)).into_response();
    if let Some(content_type) = cached
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
    {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    Some(response)
}

/// 응답 캐시 미들웨어.
///
/// # 사용 예시
///
/// ```rust,ignore
/// router.layer(middleware::from_fn_with_state(
///     CacheScope::new(cache, "system"),
///     response_cache,
/// ))
/// ```
pub async fn response_cache(
    State(scope): State<CacheScope>,
    request: Request,
    next: Next,
) -> Response {
    if !is_cacheable(&scope.cache, &request) {
        return next.run(request).await;
    }

    let directives = request_directives(&request);
    if directives.no_store {
        return next.run(request).await;
    }

    let key = scope.cache.key_for(
        scope.namespace,
        request.method(),
        request.uri().path(),
        request.uri().query(),
    );

    if !directives.no_cache {
        match scope.cache.get(&key).await {
            Ok(Some(cached)) => {
                if let Some(response) = replay(&cached) {
                    debug!(key = %key, "Cache hit");
                    metrics::counter!("cache_requests_total", "result" => "hit").increment(1);
                    return mark(response, "HIT");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "Cache lookup failed"),
        }
    }

    metrics::counter!("cache_requests_total", "result" => "miss").increment(1);
    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if bytes.len() <= MAX_CACHED_BODY {
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let cached = CachedResponse::new(parts.status.as_u16(), content_type, &bytes);
        if let Err(e) = scope.cache.put(&key, &cached).await {
            warn!(key = %key, error = %e, "Cache store failed");
        }
    }

    mark(Response::from_parts(parts, Body::from(bytes)), "MISS")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_cache;
    use axum::{middleware, routing::get, Router};
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use tower::ServiceExt;

    fn app(cache: ResponseCache, hits: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/health",
                get(move || {
                    let hits = hits.clone();
                    async move {
                        let n = hits.fetch_add(1, Ordering::SeqCst);
                        axum::Json(serde_json::json!({ "n": n }))
                    }
                }),
            )
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .layer(middleware::from_fn_with_state(
                CacheScope::new(cache, "system"),
                response_cache,
            ))
    }

    fn request(uri: &str) -> axum::http::request::Builder {
        Request::builder().uri(uri)
    }

    async fn body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_cache(true), hits.clone());

        let first = app
            .clone()
            .oneshot(request("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(first.headers()[X_CACHE], "MISS");

        let second = app
            .oneshot(request("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(second.headers()[X_CACHE], "HIT");
        assert_eq!(second.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body(second).await["n"], 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_passes_through() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_cache(false), hits.clone());

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(request("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert!(response.headers().get(X_CACHE).is_none());
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_authorized_requests_bypass() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_cache(true), hits.clone());

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    request("/health")
                        .header(AUTHORIZATION, "Bearer abc")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert!(response.headers().get(X_CACHE).is_none());
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_store_and_no_cache() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(test_cache(true), hits.clone());

        // no-store: 조회도 저장도 하지 않음
        let response = app
            .clone()
            .oneshot(
                request("/health")
                    .header(CACHE_CONTROL, "no-store")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().get(X_CACHE).is_none());

        // no-cache: 조회는 건너뛰고 새 응답을 저장
        let response = app
            .clone()
            .oneshot(
                request("/health")
                    .header(CACHE_CONTROL, "No-Cache")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[X_CACHE], "MISS");

        let response = app
            .oneshot(request("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.headers()[X_CACHE], "HIT");
        assert_eq!(body(response).await["n"], 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_ok_not_stored() {
        let cache = test_cache(true);
        let app = app(cache.clone(), Arc::new(AtomicUsize::new(0)));

        let response = app
            .oneshot(request("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(cache.info().await.unwrap()["entries"], 0);
    }
}
