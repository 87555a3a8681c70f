//! Axum용 인증 추출기.
//!
//! 두 가지 정책을 제공합니다:
//! - [`JwtAuth`]: `Authorization: Bearer <JWT>` 검증, 클레임을 핸들러에 전달
//! - [`ApiTokenAuth`]: `Authorization: Bearer <API 토큰>` 정적 비교
//!
//! 모든 거부 응답은 401 + `WWW-Authenticate: Bearer` 입니다.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        request::Parts,
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use super::{ApiToken, Claims, TokenError, TokenService};
use crate::error::ApiErrorResponse;

/// 인증 추출기가 상태에서 필요로 하는 비밀 값 접근자.
pub trait AuthProvider {
    /// 액세스 토큰 검증기.
    fn tokens(&self) -> &TokenService;
    /// 정적 API 토큰.
    fn api_token(&self) -> &ApiToken;
}

impl<T: AuthProvider> AuthProvider for Arc<T> {
    fn tokens(&self) -> &TokenService {
        (**self).tokens()
    }

    fn api_token(&self) -> &ApiToken {
        (**self).api_token()
    }
}

/// 인증 거부 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// 헤더 없음, bearer가 아닌 스킴, 빈 자격 증명
    #[error("Invalid or missing 'Bearer' prefix")]
    MissingBearer,
    /// 만료된 토큰
    #[error("Token expired")]
    TokenExpired,
    /// 형식 오류 또는 서명 불일치
    #[error("Invalid token")]
    InvalidToken,
    /// API 토큰 불일치
    #[error("Invalid API token")]
    InvalidApiToken,
}

impl AuthError {
    fn code(&self) -> &'static str {
        match self {
            AuthError::MissingBearer => "MISSING_BEARER",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::InvalidApiToken => "INVALID_API_TOKEN",
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingBearer => "missing_bearer",
            AuthError::TokenExpired => "expired",
            AuthError::InvalidToken => "invalid",
            AuthError::InvalidApiToken => "mismatch",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Expired => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorResponse::simple(self.code(), self.to_string()));
        let mut response = (StatusCode::UNAUTHORIZED, body).into_response();
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        response
    }
}

/// `Authorization` 헤더에서 bearer 자격 증명을 꺼냅니다.
///
/// 스킴은 대소문자를 구분하지 않으며, 자격 증명이 비어 있으면 없는 것으로 봅니다.
pub fn bearer_credential(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingBearer)?;

    let (scheme, credential) = header.split_once(' ').ok_or(AuthError::MissingBearer)?;
    let credential = credential.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || credential.is_empty() {
        return Err(AuthError::MissingBearer);
    }

    Ok(credential)
}

fn reject(policy: &'static str, error: AuthError) -> AuthError {
    debug!(policy, reason = error.reason(), "Request rejected");
    metrics::counter!(
        "auth_rejections_total",
        "policy" => policy,
        "reason" => error.reason()
    )
    .increment(1);
    error
}

/// JWT 인증 추출기.
///
/// 검증된 클레임은 요청 extensions에도 저장되어 이후 레이어에서 읽을 수 있습니다.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn me(JwtAuth(claims): JwtAuth) -> impl IntoResponse {
///     claims.sub
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JwtAuth(pub Claims);

impl<S> FromRequestParts<S> for JwtAuth
where
    S: AuthProvider + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_credential(parts).map_err(|e| reject("bearer", e))?;

        let claims = state
            .tokens()
            .verify(token)
            .map_err(|e| reject("bearer", e.into()))?;

        parts.extensions.insert(claims.clone());
        Ok(JwtAuth(claims))
    }
}

/// 정적 API 토큰 인증 추출기.
#[derive(Debug, Clone, Copy)]
pub struct ApiTokenAuth;

impl<S> FromRequestParts<S> for ApiTokenAuth
where
    S: AuthProvider + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let credential = bearer_credential(parts).map_err(|e| reject("api_token", e))?;

        if !state.api_token().matches(credential) {
            return Err(reject("api_token", AuthError::InvalidApiToken));
        }

        Ok(ApiTokenAuth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::test_token_service;
    use axum::{body::to_bytes, http::Request};
    use chrono::{Duration, Utc};
    use secrecy::SecretString;
    use serde_json::Map;

    struct TestState {
        tokens: TokenService,
        api_token: ApiToken,
    }

    impl AuthProvider for TestState {
        fn tokens(&self) -> &TokenService {
            &self.tokens
        }

        fn api_token(&self) -> &ApiToken {
            &self.api_token
        }
    }

    fn state() -> Arc<TestState> {
        Arc::new(TestState {
            tokens: test_token_service(),
            api_token: ApiToken::new(&SecretString::new("system-token".into())),
        })
    }

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/accounts/me");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    async fn jwt(authorization: Option<&str>) -> Result<JwtAuth, AuthError> {
        JwtAuth::from_request_parts(&mut parts(authorization), &state()).await
    }

    #[tokio::test]
    async fn test_valid_bearer_token() {
        let token = test_token_service().issue("user-1", Map::new()).unwrap();
        let mut parts = parts(Some(&format!("Bearer {}", token)));

        let JwtAuth(claims) = JwtAuth::from_request_parts(&mut parts, &state())
            .await
            .unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(parts.extensions.get::<Claims>(), Some(&claims));
    }

    #[tokio::test]
    async fn test_scheme_is_case_insensitive() {
        let token = test_token_service().issue("user-1", Map::new()).unwrap();
        assert!(jwt(Some(&format!("bEaReR {}", token))).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_or_wrong_scheme() {
        assert_eq!(jwt(None).await.unwrap_err(), AuthError::MissingBearer);
        assert_eq!(jwt(Some("Basic abc")).await.unwrap_err(), AuthError::MissingBearer);
        assert_eq!(jwt(Some("Bearer")).await.unwrap_err(), AuthError::MissingBearer);
        assert_eq!(jwt(Some("Bearer ")).await.unwrap_err(), AuthError::MissingBearer);
    }

    #[tokio::test]
    async fn test_expired_and_invalid_tokens() {
        let expired = test_token_service()
            .issue_at("user-1", Map::new(), Utc::now() - Duration::minutes(61))
            .unwrap();
        assert_eq!(
            jwt(Some(&format!("Bearer {}", expired))).await.unwrap_err(),
            AuthError::TokenExpired
        );
        assert_eq!(
            jwt(Some("Bearer garbage")).await.unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[tokio::test]
    async fn test_api_token_policy() {
        let state = state();

        let ok = ApiTokenAuth::from_request_parts(&mut parts(Some("Bearer system-token")), &state)
            .await;
        assert!(ok.is_ok());

        let wrong = ApiTokenAuth::from_request_parts(&mut parts(Some("Bearer nope")), &state)
            .await
            .unwrap_err();
        assert_eq!(wrong, AuthError::InvalidApiToken);

        let missing = ApiTokenAuth::from_request_parts(&mut parts(None), &state)
            .await
            .unwrap_err();
        assert_eq!(missing, AuthError::MissingBearer);
    }

    #[tokio::test]
    async fn test_rejection_response() {
        let response = AuthError::TokenExpired.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(WWW_AUTHENTICATE).unwrap(), "Bearer");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Token expired");
    }
}
