//! 계정 서비스.
//!
//! 회원가입, 로그인, 계정 조회/수정을 담당합니다.
//! 저장소와 비밀번호/토큰 처리기를 조합할 뿐 자체 상태는 없습니다.

use std::sync::Arc;

use axum::{http::StatusCode, Json};
use serde_json::Map;
use template_core::{User, UserCreate, UserPublic, UserUpdate};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::auth::{PasswordError, PasswordHasher, TokenError, TokenService};
use crate::error::{ApiError, ApiErrorResponse};
use crate::repository::{StoreError, UserStore};

/// 계정 서비스 에러.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// 같은 이메일의 계정이 이미 있음
    #[error("The user with this email already exists in the system")]
    Conflict,

    /// 계정 없음
    #[error("User not found")]
    NotFound,

    /// 이메일 또는 비밀번호 불일치
    #[error("Incorrect email or password")]
    BadCredentials,

    /// 비밀번호 해싱 실패
    #[error("비밀번호 처리 실패: {0}")]
    Password(#[from] PasswordError),

    /// 토큰 발급 실패
    #[error("토큰 처리 실패: {0}")]
    Token(#[from] TokenError),

    /// 저장소 실패
    #[error("저장소 에러: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate => AccountError::Conflict,
            other => AccountError::Storage(other),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(error: AccountError) -> Self {
        let (status, code) = match &error {
            AccountError::Conflict => (StatusCode::CONFLICT, "USER_EXISTS"),
            AccountError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AccountError::BadCredentials => (StatusCode::BAD_REQUEST, "BAD_CREDENTIALS"),
            AccountError::Password(_) | AccountError::Token(_) | AccountError::Storage(_) => {
                error!(error = %error, "Account operation failed");
                return ApiErrorResponse::internal();
            }
        };

        (status, Json(ApiErrorResponse::new(code, error.to_string())))
    }
}

/// 계정 서비스.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
}

impl AccountService {
    /// 새 서비스를 생성합니다.
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, tokens: Arc<TokenService>) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// 저장소 핸들.
    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// 새 계정을 등록합니다.
    ///
    /// 이메일은 대소문자를 구분해 비교합니다. 동시에 같은 이메일로 등록하면
    /// 저장소의 유일성 제약에 따라 하나만 성공하고 나머지는 [`AccountError::Conflict`]입니다.
    pub async fn register(&self, request: &UserCreate) -> Result<UserPublic, AccountError> {
        if self.store.find_by_email(&request.email).await?.is_some() {
            debug!("Signup rejected: email already registered");
            return Err(AccountError::Conflict);
        }

        let hashed_password = self.hash(request.password.clone()).await?;
        let user = User::new(
            &request.email,
            &request.first_name,
            &request.last_name,
            hashed_password,
        );

        let stored = self.store.insert(&user).await?;
        info!(user_id = %stored.id, "Account registered");

        Ok(stored.into())
    }

    /// 이메일과 비밀번호로 계정을 확인합니다.
    ///
    /// 이메일이 없을 때와 비밀번호가 틀릴 때 모두 `None`을 반환합니다.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, AccountError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            return Ok(None);
        };

        if self
            .verify(password.to_string(), user.hashed_password.clone())
            .await
        {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// 로그인하고 액세스 토큰을 발급합니다.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AccountError> {
        let Some(user) = self.authenticate(email, password).await? else {
            metrics::counter!("account_logins_total", "outcome" => "rejected").increment(1);
            return Err(AccountError::BadCredentials);
        };

        let token = self.tokens.issue(&user.id.to_string(), Map::new())?;
        metrics::counter!("account_logins_total", "outcome" => "success").increment(1);
        info!(user_id = %user.id, "Login succeeded");

        Ok(token)
    }

    /// ID로 계정을 조회합니다.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, AccountError> {
        Ok(self.store.find_by_id(id).await?)
    }

    /// 계정 정보를 수정합니다. 값이 있는 필드만 바뀝니다.
    pub async fn update(
        &self,
        id: Uuid,
        changes: &UserUpdate,
    ) -> Result<Option<User>, AccountError> {
        if changes.is_empty() {
            return self.get_by_id(id).await;
        }

        let updated = self.store.update(id, changes).await?;
        if updated.is_some() {
            info!(user_id = %id, "Account updated");
        }
        Ok(updated)
    }

    // Argon2 연산은 CPU를 오래 점유하므로 blocking 스레드에서 실행
    async fn hash(&self, password: String) -> Result<String, AccountError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|_| AccountError::Password(PasswordError::HashingFailed))?
            .map_err(AccountError::from)
    }

    async fn verify(&self, password: String, hash: String) -> bool {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
pub(crate) fn test_account_service(store: Arc<dyn UserStore>) -> AccountService {
    AccountService::new(
        store,
        crate::auth::password::fast_hasher(),
        Arc::new(crate::auth::jwt::test_token_service()),
    )
}
