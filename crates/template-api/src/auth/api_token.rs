//! 시스템 엔드포인트용 정적 API 토큰.

use secrecy::{ExposeSecret, SecretString};

/// 설정에서 주입된 정적 API 토큰.
///
/// `Debug` 출력에서 값이 노출되지 않습니다.
#[derive(Debug)]
pub struct ApiToken(SecretString);

impl ApiToken {
    /// 토큰을 생성합니다.
    pub fn new(token: &SecretString) -> Self {
        Self(SecretString::new(token.expose_secret().into()))
    }

    /// 제시된 자격 증명이 토큰과 같은지 비교합니다.
    ///
    /// 길이가 같으면 내용과 무관하게 모든 바이트를 비교합니다.
    pub fn matches(&self, presented: &str) -> bool {
        constant_time_eq(self.0.expose_secret().as_bytes(), presented.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches() {
        let token = ApiToken::new(&SecretString::new("s3cret".into()));

        assert!(token.matches("s3cret"));
        assert!(!token.matches("s3creT"));
        assert!(!token.matches("s3cret "));
        assert!(!token.matches(""));
    }

    #[test]
    fn test_debug_redacts() {
        let token = ApiToken::new(&SecretString::new("s3cret".into()));
        assert!(!format!("{:?}", token).contains("s3cret"));
    }
}
