//! 환경 변수 기반 설정 로드 테스트.
//!
//! 환경 변수는 프로세스 전역이므로 이 파일에는 테스트 하나만 둡니다.

use secrecy::ExposeSecret;
use template_core::{AppConfig, CacheBackendKind};

#[test]
fn environment_overrides_missing_file() {
    std::env::set_var("APP__API__TOKEN", "00042");
    std::env::set_var("APP__API__ORIGINS", "http://a.test,http://b.test");
    std::env::set_var("APP__TOKEN__SECRET_KEY", "1e3");
    std::env::set_var("APP__TOKEN__EXPIRATION_MINUTES", "15");
    std::env::set_var("APP__SERVER__PORT", "9000");
    std::env::set_var("APP__CACHE__BACKEND", "redis");
    std::env::set_var("APP__CACHE__CONNECTION_STRING", "redis://localhost:6379");
    std::env::set_var("APP__CACHE__ENABLED", "true");
    std::env::set_var("APP__CACHE__EXPIRATION", "30");

    let config = AppConfig::load("does/not/exist.toml").unwrap();

    // 숫자처럼 보이는 비밀 값도 문자열 그대로 유지
    assert_eq!(config.api.token.expose_secret(), "00042");
    assert_eq!(config.token.secret_key.expose_secret(), "1e3");

    assert_eq!(
        config.api.origins,
        vec!["http://a.test".to_string(), "http://b.test".to_string()]
    );
    assert_eq!(config.token.expiration_minutes, 15);
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.cache.backend, CacheBackendKind::Redis);
    assert!(config.cache.enabled);
    assert_eq!(config.cache.expiration, Some(30));
    assert!(config.database.is_none());

    std::env::remove_var("APP__CACHE__CONNECTION_STRING");
    let err = AppConfig::load("does/not/exist.toml").unwrap_err();
    assert!(err.to_string().contains("connection_string"));
}
