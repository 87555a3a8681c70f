//! OpenAPI 문서화 설정.
//!
//! utoipa로 OpenAPI 3 문서를 생성합니다. `api.docs_enabled`가 켜져 있으면
//! Swagger UI가 `/docs`에 마운트됩니다.
//!
//! 새 엔드포인트를 추가할 때:
//!
//! 1. 요청/응답 타입에 `ToSchema` derive 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)`에 등록

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::ComponentsBuilder;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use template_core::{TokenResponse, UserCreate, UserLogin, UserPublic, UserUpdate};

use crate::error::ApiErrorResponse;
use crate::routes::{
    CacheInfoResponse, ComponentHealth, ComponentStatus, HealthResponse, ReadinessResponse,
};

/// 보안 스킴 등록: 사용자 JWT(`bearer`)와 시스템 API 토큰(`api_token`).
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(|| ComponentsBuilder::new().build());

        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "api_token",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// 계정 API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Template Account API",
        description = r#"
# 계정 API

회원가입, 로그인, 계정 관리를 위한 REST API입니다.

## 인증

- 계정 엔드포인트: `Authorization: Bearer <access_token>` (`POST /login`으로 발급)
- 시스템 엔드포인트: `Authorization: Bearer <API 토큰>`
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    tags(
        (name = "accounts", description = "계정 - 회원가입, 로그인, 내 정보"),
        (name = "system", description = "시스템 - 헬스 체크, 응답 캐시 관리")
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            // ===== Accounts =====
            UserCreate,
            UserLogin,
            UserUpdate,
            UserPublic,
            TokenResponse,

            // ===== System =====
            HealthResponse,
            ReadinessResponse,
            ComponentHealth,
            ComponentStatus,
            CacheInfoResponse,

            // ===== Common =====
            ApiErrorResponse,
        )
    ),
    paths(
        crate::routes::accounts::signup,
        crate::routes::accounts::login,
        crate::routes::accounts::get_me,
        crate::routes::accounts::update_me,
        crate::routes::health::health_check,
        crate::routes::health::health_ready,
        crate::routes::system::clear_cache,
        crate::routes::system::cache_info,
    )
)]
pub struct ApiDoc;

/// Swagger UI 라우터 생성.
///
/// - `/docs` - Swagger UI
/// - `/api-docs/openapi.json` - OpenAPI JSON
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
