//! 인증 및 권한 부여.
//!
//! # 구성 요소
//!
//! - [`PasswordHasher`]: Argon2id 비밀번호 해싱/검증
//! - [`TokenService`]: 액세스 토큰 발급/검증
//! - [`JwtAuth`], [`ApiTokenAuth`]: Axum 인증 추출기
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn protected_handler(JwtAuth(claims): JwtAuth) -> impl IntoResponse {
//!     format!("Hello, {}!", claims.sub)
//! }
//! ```

mod api_token;
pub(crate) mod jwt;
mod middleware;
pub(crate) mod password;

pub use api_token::ApiToken;
pub use jwt::{Claims, TokenError, TokenService};
pub use middleware::{bearer_credential, ApiTokenAuth, AuthError, AuthProvider, JwtAuth};
pub use password::{PasswordError, PasswordHasher};
