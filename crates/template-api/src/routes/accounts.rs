//! 계정 endpoint.
//!
//! - `POST /signup`: 회원가입
//! - `POST /login`: 로그인 (액세스 토큰 발급)
//! - `GET /accounts/me`: 내 계정 조회
//! - `PATCH /accounts/me`: 내 계정 수정

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use template_core::{TokenResponse, UserCreate, UserLogin, UserPublic, UserUpdate};
use uuid::Uuid;
use validator::Validate;

use crate::auth::JwtAuth;
use crate::error::{ApiErrorResponse, ApiJson, ApiResult};
use crate::services::AccountError;
use crate::state::AppState;

/// 토큰 `sub`를 계정 ID로 해석합니다. UUID가 아니면 없는 계정으로 취급합니다.
fn account_id(sub: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(sub).map_err(|_| AccountError::NotFound.into())
}

/// 회원가입.
#[utoipa::path(
    post,
    path = "/signup",
    tag = "accounts",
    request_body = UserCreate,
    responses(
        (status = 201, description = "계정 생성됨", body = UserPublic),
        (status = 400, description = "입력값 오류", body = ApiErrorResponse),
        (status = 409, description = "이미 존재하는 이메일", body = ApiErrorResponse),
        (status = 422, description = "필드 누락 또는 타입 불일치", body = ApiErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<UserCreate>,
) -> ApiResult<(StatusCode, Json<UserPublic>)> {
    request
        .validate()
        .map_err(|e| ApiErrorResponse::validation(&e))?;

    let user = state.accounts.register(&request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// 로그인.
///
/// 이메일이 없거나 비밀번호가 틀리면 같은 400 응답을 반환합니다.
#[utoipa::path(
    post,
    path = "/login",
    tag = "accounts",
    request_body = UserLogin,
    responses(
        (status = 200, description = "토큰 발급", body = TokenResponse),
        (status = 400, description = "이메일 또는 비밀번호 불일치", body = ApiErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<UserLogin>,
) -> ApiResult<Json<TokenResponse>> {
    request
        .validate()
        .map_err(|e| ApiErrorResponse::validation(&e))?;

    let token = state
        .accounts
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(TokenResponse::bearer(token)))
}

/// 내 계정 조회.
#[utoipa::path(
    get,
    path = "/accounts/me",
    tag = "accounts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "계정 정보", body = UserPublic),
        (status = 401, description = "인증 실패", body = ApiErrorResponse),
        (status = 404, description = "계정 없음", body = ApiErrorResponse)
    )
)]
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
) -> ApiResult<Json<UserPublic>> {
    let id = account_id(&claims.sub)?;

    let user = state
        .accounts
        .get_by_id(id)
        .await?
        .ok_or(AccountError::NotFound)?;
    Ok(Json(user.into()))
}

/// 내 계정 수정.
///
/// 본문에 있는 필드만 바뀝니다.
#[utoipa::path(
    patch,
    path = "/accounts/me",
    tag = "accounts",
    security(("bearer" = [])),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "수정된 계정 정보", body = UserPublic),
        (status = 401, description = "인증 실패", body = ApiErrorResponse),
        (status = 404, description = "계정 없음", body = ApiErrorResponse)
    )
)]
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    ApiJson(changes): ApiJson<UserUpdate>,
) -> ApiResult<Json<UserPublic>> {
    changes
        .validate()
        .map_err(|e| ApiErrorResponse::validation(&e))?;
    let id = account_id(&claims.sub)?;

    let user = state
        .accounts
        .update(id, &changes)
        .await?
        .ok_or(AccountError::NotFound)?;
    Ok(Json(user.into()))
}

/// 계정 라우터 생성.
pub fn accounts_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/accounts/me", get(get_me).patch(update_me))
}
