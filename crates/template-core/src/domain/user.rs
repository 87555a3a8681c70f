//! 사용자 계정 모델.
//!
//! 용도별로 분리된 구조체를 사용합니다:
//! - [`User`]: 저장된 계정 레코드 (해시 포함, 외부 노출 금지)
//! - [`UserCreate`], [`UserLogin`], [`UserUpdate`]: 요청 본문
//! - [`UserPublic`], [`TokenResponse`]: 응답 본문

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 비밀번호 최소 길이.
pub const PASSWORD_MIN_LEN: u64 = 8;
/// 비밀번호 최대 길이.
pub const PASSWORD_MAX_LEN: u64 = 40;

/// 저장된 사용자 계정.
///
/// `hashed_password`는 직렬화 대상이 아닙니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct User {
    /// 계정 ID
    pub id: Uuid,
    /// 이메일 (대소문자 구분, 유일)
    pub email: String,
    /// 이름
    pub first_name: String,
    /// 성
    pub last_name: String,
    /// Argon2 PHC 해시 문자열
    #[serde(skip_serializing)]
    pub hashed_password: String,
    /// 생성 시각
    pub created_at: DateTime<Utc>,
    /// 마지막 수정 시각
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// 새 계정 레코드를 생성합니다. ID와 시각은 여기서 정해집니다.
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        hashed_password: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            hashed_password: hashed_password.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 변경 사항을 적용합니다. 값이 있는 필드만 바뀝니다.
    pub fn apply(&mut self, changes: &UserUpdate) {
        if let Some(first_name) = &changes.first_name {
            self.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            self.last_name = last_name.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// 회원가입 요청.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct UserCreate {
    /// 이메일
    #[validate(
        email(message = "invalid email address"),
        length(max = 255, message = "email must be at most 255 characters")
    )]
    pub email: String,
    /// 이름
    #[validate(length(max = 255, message = "first_name must be at most 255 characters"))]
    pub first_name: String,
    /// 성
    #[validate(length(max = 255, message = "last_name must be at most 255 characters"))]
    pub last_name: String,
    /// 비밀번호 (8~40자)
    #[validate(length(min = 8, max = 40, message = "password must be 8 to 40 characters"))]
    pub password: String,
}

/// 로그인 요청.
#[derive(Debug, Clone, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct UserLogin {
    /// 이메일
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    /// 비밀번호
    #[validate(length(min = 8, max = 40, message = "password must be 8 to 40 characters"))]
    pub password: String,
}

/// 계정 정보 부분 수정 요청.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct UserUpdate {
    /// 새 이름
    #[validate(length(max = 255, message = "first_name must be at most 255 characters"))]
    pub first_name: Option<String>,
    /// 새 성
    #[validate(length(max = 255, message = "last_name must be at most 255 characters"))]
    pub last_name: Option<String>,
}

impl UserUpdate {
    /// 변경할 필드가 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none()
    }
}

/// 외부에 노출되는 계정 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct UserPublic {
    /// 계정 ID
    pub id: Uuid,
    /// 이메일
    pub email: String,
    /// 이름
    pub first_name: String,
    /// 성
    pub last_name: String,
}

impl From<User> for UserPublic {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// 로그인 응답.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct TokenResponse {
    /// 서명된 액세스 토큰
    pub access_token: String,
    /// 토큰 유형 (항상 "bearer")
    pub token_type: String,
}

impl TokenResponse {
    /// bearer 토큰 응답을 생성합니다.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "bearer".to_string(),
        }
    }
}
