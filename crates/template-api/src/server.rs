//! 서버 조립 및 실행.
//!
//! 설정에서 상태를 만들고, 라우터에 공통 레이어를 씌운 뒤 graceful shutdown과 함께 실행합니다.
//! `template-api` 바이너리와 `template-cli api start`가 같은 진입점을 사용합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use regex::Regex;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use template_core::{AppConfig, ConfigError};

use crate::auth::{ApiToken, PasswordError, PasswordHasher, TokenError, TokenService};
use crate::cache::{CacheError, ResponseCache};
use crate::db::{Database, DbError};
use crate::metrics::setup_metrics_recorder;
use crate::middleware::metrics_layer;
use crate::openapi::swagger_ui_router;
use crate::repository::{MemoryUserStore, PgUserStore, UserStore};
use crate::routes::create_api_router;
use crate::services::AccountService;
use crate::state::AppState;

/// 요청 처리 제한 시간.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 서버 시작 에러.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("잘못된 바인딩 주소: {0}")]
    Address(String),

    #[error("서버 I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정으로 애플리케이션 상태를 만듭니다.
///
/// `[database]` 섹션이 없으면 메모리 저장소를 사용합니다.
pub async fn build_state(config: &AppConfig) -> Result<AppState, ServerError> {
    let hasher = PasswordHasher::new(&config.password)?;
    let tokens = Arc::new(TokenService::from_config(&config.token)?);
    let cache = ResponseCache::connect(&config.cache).await?;

    let store: Arc<dyn UserStore> = match &config.database {
        Some(db_config) => {
            let database = Database::connect(db_config).await?;
            Arc::new(PgUserStore::new(database.pool().clone()))
        }
        None => {
            warn!("Database not configured, accounts are kept in memory only");
            Arc::new(MemoryUserStore::new())
        }
    };

    let accounts = AccountService::new(store, hasher, tokens.clone());
    Ok(AppState::new(
        accounts,
        tokens,
        ApiToken::new(&config.api.token),
        cache,
    ))
}

/// CORS 레이어.
///
/// 목록에 있거나 `origin_regex`에 전체 일치하는 origin만 허용하며
/// 자격 증명(쿠키, Authorization)을 허용합니다.
/// 둘 다 비어 있으면 cross-origin 요청을 허용하지 않습니다.
pub fn cors_layer(origins: &[String], origin_regex: Option<&str>) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let pattern = origin_regex.and_then(|raw| match anchored_regex(raw) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!(pattern = %raw, error = %e, "Ignoring invalid CORS origin regex");
            None
        }
    });

    if allowed.is_empty() && pattern.is_none() {
        info!("No CORS origins configured, cross-origin requests are not allowed");
    } else {
        info!(
            origins = allowed.len(),
            regex = pattern.is_some(),
            "CORS configured"
        );
    }

    let allow_origin = match pattern {
        None => AllowOrigin::list(allowed),
        Some(pattern) => AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            allowed.contains(origin)
                || origin
                    .to_str()
                    .is_ok_and(|origin| pattern.is_match(origin))
        }),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CACHE_CONTROL,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// origin 전체와 일치해야 하므로 양끝을 고정합니다.
fn anchored_regex(raw: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", raw))
}

async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
///
/// # Arguments
///
/// * `state` - 공유 상태
/// * `config` - CORS origin과 문서 노출 여부에 사용
/// * `metrics_handle` - 있으면 `/metrics` 노출
pub fn create_router(
    state: Arc<AppState>,
    config: &AppConfig,
    metrics_handle: Option<PrometheusHandle>,
) -> Router {
    let mut router = create_api_router(&state).with_state(state);

    if let Some(handle) = metrics_handle {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics_handler))
                .with_state(handle),
        );
    }

    if config.api.docs_enabled {
        router = router.merge(swagger_ui_router());
    }

    router
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(cors_layer(
            &config.api.origins,
            config.api.origin_regex.as_deref(),
        ))
}

/// 서버를 실행합니다. 종료 시그널을 받을 때까지 반환하지 않습니다.
///
/// # Arguments
///
/// * `config` - 애플리케이션 설정
/// * `addr` - 바인딩 주소. None이면 `[server]` 설정 사용
pub async fn run(config: AppConfig, addr: Option<SocketAddr>) -> Result<(), ServerError> {
    let addr = match addr {
        Some(addr) => addr,
        None => format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|_| {
                ServerError::Address(format!("{}:{}", config.server.host, config.server.port))
            })?,
    };

    let metrics_handle = match setup_metrics_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Metrics recorder unavailable, /metrics disabled");
            None
        }
    };

    let state = Arc::new(build_state(&config).await?);
    info!(
        version = %state.version,
        store = state.accounts.store().backend(),
        cache = state.cache.backend_name(),
        cache_enabled = state.cache.is_enabled(),
        "Application state initialized"
    );

    let app = create_router(state, &config, metrics_handle);

    info!(%addr, "API server listening");
    if config.api.docs_enabled {
        info!("Swagger UI available at http://{}/docs", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM을 기다립니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    const CONFIG: &str = r#"
        [api]
        token = "test-api-token"
        origins = ["http://localhost:3000"]
        origin_regex = "https://[a-z0-9-]+\\.preview\\.example\\.com"

        [token]
        secret_key = "test-secret"
    "#;

    #[tokio::test]
    async fn test_build_state_without_database() {
        let config = AppConfig::from_toml_str(CONFIG).unwrap();
        let state = build_state(&config).await.unwrap();

        assert_eq!(state.accounts.store().backend(), "memory");
        assert_eq!(state.cache.backend_name(), "in-memory");
    }

    #[tokio::test]
    async fn test_router_serves_docs_and_cors() {
        let config = AppConfig::from_toml_str(CONFIG).unwrap();
        let app = create_router(Arc::new(create_test_state()), &config, None);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let with_origin = |origin: &str| {
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, origin)
                .body(Body::empty())
                .unwrap()
        };

        let response = app
            .clone()
            .oneshot(with_origin("http://localhost:3000"))
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );

        // 정규식과 일치하는 origin
        let response = app
            .clone()
            .oneshot(with_origin("https://pr-42.preview.example.com"))
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://pr-42.preview.example.com"
        );

        // 부분 일치는 허용하지 않음
        for origin in [
            "https://pr-42.preview.example.com.evil.test",
            "http://evil.test",
        ] {
            let response = app.clone().oneshot(with_origin(origin)).await.unwrap();
            assert!(response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none());
        }
    }

    #[test]
    fn test_anchored_regex() {
        let regex = anchored_regex("https://a|https://b").unwrap();
        assert!(regex.is_match("https://a"));
        assert!(regex.is_match("https://b"));
        assert!(!regex.is_match("https://ab"));
        assert!(anchored_regex("(").is_err());
    }

    #[tokio::test]
    async fn test_docs_disabled() {
        let mut config = AppConfig::from_toml_str(CONFIG).unwrap();
        config.api.docs_enabled = false;
        let app = create_router(Arc::new(create_test_state()), &config, None);

        let response = app
            .oneshot(Request::builder().uri("/docs/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
