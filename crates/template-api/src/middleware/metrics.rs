//! HTTP 요청 metrics middleware.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use crate::metrics::{record_http_duration, record_http_request, record_http_response};

/// 매칭되지 않은 경로는 하나의 라벨로 묶어 카디널리티를 제한합니다.
const UNMATCHED_PATH: &str = "unmatched";

/// HTTP 메트릭을 수집하는 미들웨어.
///
/// 경로 라벨에는 실제 URI 대신 라우트 패턴(`MatchedPath`)을 사용합니다.
/// `Router::layer`로 적용해야 라우팅 결과를 볼 수 있습니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());

    record_http_request(&method, &path);

    let response = next.run(request).await;

    record_http_response(&method, &path, response.status().as_u16());
    record_http_duration(&method, &path, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn test_handler() -> &'static str {
        "OK"
    }

    fn app() -> Router {
        Router::new()
            .route("/items/{id}", get(test_handler))
            .layer(middleware::from_fn(metrics_layer))
    }

    #[tokio::test]
    async fn test_metrics_middleware_passes_response() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/items/123e4567-e89b-12d3-a456-426614174000")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_middleware_unmatched() {
        let request = Request::builder()
            .uri("/nope")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
