//! 액세스 토큰 발급/검증.
//!
//! HMAC(HS256/HS384/HS512)으로 서명한 JWT를 사용합니다.
//! `sub`와 `exp`는 예약 클레임이며 항상 서버가 정한 값이 우선합니다.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use template_core::TokenConfig;

/// 서버가 항상 직접 채우는 클레임.
const RESERVED_CLAIMS: [&str; 2] = ["sub", "exp"];

/// 토큰 처리 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// 만료 시각이 지남
    #[error("토큰이 만료되었습니다")]
    Expired,
    /// 파싱할 수 없는 토큰
    #[error("잘못된 형식의 토큰")]
    Malformed,
    /// 서명 불일치
    #[error("토큰 서명이 유효하지 않습니다")]
    InvalidSignature,
    /// 서명 실패
    #[error("토큰 생성 실패: {0}")]
    Encoding(String),
    /// HMAC 계열이 아닌 알고리즘
    #[error("지원하지 않는 알고리즘: {0}")]
    UnsupportedAlgorithm(String),
    /// 비어 있는 서명 키
    #[error("서명 키가 비어 있습니다")]
    EmptySecret,
    /// 표현할 수 없는 유효 시간
    #[error("잘못된 토큰 유효 시간: {0}분")]
    InvalidTtl(i64),
}

/// 토큰 페이로드.
///
/// 예약 클레임 외의 값은 `extra`에 그대로 보존됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 계정 ID
    pub sub: String,
    /// Expiration - 만료 시각 (Unix timestamp, 초)
    pub exp: i64,
    /// 추가 클레임
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 토큰 발급기 겸 검증기.
///
/// 생성 이후에는 불변이므로 `Arc`로 감싸 요청 간에 공유합니다.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
    verify_expiration: bool,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("ttl_minutes", &self.ttl.num_minutes())
            .field("verify_expiration", &self.verify_expiration)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// 새 토큰 서비스를 생성합니다.
    ///
    /// # Arguments
    ///
    /// * `secret` - HMAC 서명 키 (비어 있으면 안 됨)
    /// * `algorithm` - `HS256`, `HS384`, `HS512` 중 하나
    /// * `ttl_minutes` - 발급 토큰 유효 시간 (분)
    /// * `verify_expiration` - false면 만료를 검사하지 않음
    pub fn new(
        secret: &[u8],
        algorithm: &str,
        ttl_minutes: i64,
        verify_expiration: bool,
    ) -> Result<Self, TokenError> {
        let algorithm = match algorithm.to_uppercase().as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            _ => return Err(TokenError::UnsupportedAlgorithm(algorithm.to_string())),
        };
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        let ttl = Duration::try_minutes(ttl_minutes)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or(TokenError::InvalidTtl(ttl_minutes))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            ttl,
            verify_expiration,
        })
    }

    /// `[token]` 설정 섹션에서 생성합니다.
    pub fn from_config(config: &TokenConfig) -> Result<Self, TokenError> {
        Self::new(
            config.secret_key.expose_secret().as_bytes(),
            &config.algorithm,
            config.expiration_minutes,
            config.verify_expiration,
        )
    }

    /// 토큰을 발급합니다.
    ///
    /// # Arguments
    ///
    /// * `subject` - `sub` 클레임 값 (계정 ID)
    /// * `extra` - 추가 클레임. `sub`/`exp` 항목은 무시됩니다.
    pub fn issue(&self, subject: &str, extra: Map<String, Value>) -> Result<String, TokenError> {
        self.issue_at(subject, extra, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        subject: &str,
        mut extra: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        for reserved in RESERVED_CLAIMS {
            extra.remove(reserved);
        }

        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::InvalidTtl(self.ttl.num_minutes()))?;

        let claims = Claims {
            sub: subject.to_string(),
            exp: exp.timestamp(),
            extra,
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// 토큰을 검증하고 클레임을 반환합니다.
    ///
    /// 서명을 먼저 확인한 뒤 만료를 확인합니다. 만료 판정은 유예 시간 없이
    /// `exp < now`일 때만 실패합니다.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub(crate) fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed,
            })?
            .claims;

        if self.verify_expiration && claims.exp < now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        // 만료는 verify_at에서 같은 시계로 직접 판정
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims =
            HashSet::from(RESERVED_CLAIMS.map(|claim| claim.to_string()));
        validation
    }
}

#[cfg(test)]
pub(crate) fn test_token_service() -> TokenService {
    TokenService::new(b"test-secret", "HS256", 60, true).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_issue_and_verify() {
        let service = test_token_service();
        let mut extra = Map::new();
        extra.insert("scope".to_string(), json!("accounts"));

        let token = service.issue("user-1", extra).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.extra.get("scope"), Some(&json!("accounts")));
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_reserved_claims_cannot_be_overridden() {
        let service = test_token_service();
        let now = Utc::now();
        let mut extra = Map::new();
        extra.insert("sub".to_string(), json!("admin"));
        extra.insert("exp".to_string(), json!(0));

        let token = service.issue_at("user-1", extra, now).unwrap();
        let claims = service.verify_at(&token, now).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.exp, (now + Duration::minutes(60)).timestamp());
        assert!(claims.extra.is_empty());
    }

    #[test]
    fn test_expired_token() {
        let service = test_token_service();
        let issued = Utc::now();
        let token = service.issue_at("user-1", Map::new(), issued).unwrap();

        // 정확히 만료 시각이면 아직 유효
        assert!(service
            .verify_at(&token, issued + Duration::minutes(60))
            .is_ok());
        assert_eq!(
            service.verify_at(&token, issued + Duration::minutes(61)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_expiration_check_disabled() {
        let service = TokenService::new(b"test-secret", "HS256", 60, false).unwrap();
        let token = service
            .issue_at("user-1", Map::new(), Utc::now() - Duration::days(1))
            .unwrap();

        assert!(service.verify(&token).is_ok());
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let token = test_token_service().issue("user-1", Map::new()).unwrap();
        let other = TokenService::new(b"other-secret", "HS256", 60, true).unwrap();

        assert_eq!(other.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_expired_with_wrong_secret_reports_signature() {
        let issued = Utc::now() - Duration::days(1);
        let token = test_token_service()
            .issue_at("user-1", Map::new(), issued)
            .unwrap();
        let other = TokenService::new(b"other-secret", "HS256", 60, true).unwrap();

        assert_eq!(other.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let service = test_token_service();
        assert_eq!(service.verify("not.a.token"), Err(TokenError::Malformed));
        assert_eq!(service.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_constructor_rejects_bad_settings() {
        assert!(matches!(
            TokenService::new(b"secret", "RS256", 60, true),
            Err(TokenError::UnsupportedAlgorithm(_))
        ));
        assert_eq!(
            TokenService::new(b"", "HS256", 60, true).unwrap_err(),
            TokenError::EmptySecret
        );
        assert!(TokenService::new(b"secret", "hs512", 60, true).is_ok());
    }

    #[test]
    fn test_out_of_range_ttl_is_error() {
        assert_eq!(
            TokenService::new(b"secret", "HS256", i64::MAX, true).unwrap_err(),
            TokenError::InvalidTtl(i64::MAX)
        );
        assert_eq!(
            TokenService::new(b"secret", "HS256", 0, true).unwrap_err(),
            TokenError::InvalidTtl(0)
        );

        // 생성은 되지만 만료 시각이 날짜 범위를 넘는 경우
        let service = TokenService::new(b"secret", "HS256", 1_000_000_000_000, true).unwrap();
        assert!(matches!(
            service.issue("user-1", Map::new()),
            Err(TokenError::InvalidTtl(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_subject_round_trips(subject in "[a-zA-Z0-9-]{1,64}") {
            let service = test_token_service();
            let token = service.issue(&subject, Map::new()).unwrap();
            prop_assert_eq!(service.verify(&token).unwrap().sub, subject);
        }
    }
}
