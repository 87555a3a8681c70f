//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 설정은 프로세스 시작 시 한 번 로드되어 각 컴포넌트 생성자에 주입되며,
//! 이후에는 읽기 전용으로만 사용됩니다.

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// 환경 변수 접두사 (예: `APP__TOKEN__SECRET_KEY`).
pub const ENV_PREFIX: &str = "APP";

/// 토큰 유효 시간 상한 (분, 1년).
pub const MAX_TOKEN_EXPIRATION_MINUTES: i64 = 60 * 24 * 365;

/// 애플리케이션 설정.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 데이터베이스 설정 (없으면 메모리 저장소로 동작)
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// API 설정
    pub api: ApiConfig,
    /// 응답 캐시 설정
    #[serde(default)]
    pub cache: CacheConfig,
    /// 토큰 발급/검증 설정
    pub token: TokenConfig,
    /// 비밀번호 해싱 설정
    #[serde(default)]
    pub password: PasswordConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    /// 호스트 이름
    pub hostname: String,
    /// 포트
    pub port: u16,
    /// 데이터베이스 이름
    pub database: String,
    /// 사용자
    pub user: String,
    /// 비밀번호
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: SecretString,
    /// 상시 유지할 연결 수
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// 풀 크기를 넘어 추가로 열 수 있는 연결 수
    #[serde(default = "default_max_overflow")]
    pub max_overflow: u32,
    /// 연결 재활용 주기 (초, 음수면 비활성화)
    #[serde(default = "default_pool_recycle")]
    pub pool_recycle_secs: i64,
    /// 연결 획득 전 ping 여부
    #[serde(default)]
    pub pool_pre_ping: bool,
    /// 실행 SQL 로깅 여부
    #[serde(default)]
    pub echo: bool,
    /// 연결 타임아웃 (초)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_pool_size() -> u32 {
    5
}
fn default_max_overflow() -> u32 {
    10
}
fn default_pool_recycle() -> i64 {
    -1
}
fn default_connect_timeout() -> u64 {
    30
}

impl DatabaseConfig {
    /// 최대 연결 수 (풀 크기 + overflow).
    pub fn max_connections(&self) -> u32 {
        self.pool_size + self.max_overflow
    }

    /// 연결 재활용 주기. 음수 설정이면 None.
    pub fn max_lifetime(&self) -> Option<std::time::Duration> {
        u64::try_from(self.pool_recycle_secs)
            .ok()
            .map(std::time::Duration::from_secs)
    }
}

/// API 설정.
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    /// CORS 허용 origin 목록 (환경 변수에서는 쉼표로 구분)
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub origins: Vec<String>,
    /// CORS 허용 origin 정규식 (목록과 함께 적용)
    #[serde(default)]
    pub origin_regex: Option<String>,
    /// API 문서(Swagger UI) 노출 여부
    #[serde(default = "default_true")]
    pub docs_enabled: bool,
    /// 시스템 엔드포인트용 정적 API 토큰
    #[serde(deserialize_with = "deserialize_secret")]
    pub token: SecretString,
}

/// 응답 캐시 백엔드 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheBackendKind {
    /// 프로세스 메모리
    #[default]
    InMemory,
    /// Redis
    Redis,
}

/// 응답 캐시 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// 백엔드 종류
    #[serde(default)]
    pub backend: CacheBackendKind,
    /// Redis 연결 문자열 (redis 백엔드에서 필수)
    #[serde(default)]
    pub connection_string: Option<String>,
    /// 캐시 키 접두사
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,
    /// 만료 시간 (초, None이면 만료 없음)
    #[serde(default)]
    pub expiration: Option<u64>,
    /// 캐시 활성화 여부
    #[serde(default)]
    pub enabled: bool,
    /// 메모리 백엔드 최대 항목 수
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: u64,
}

fn default_cache_prefix() -> String {
    "jobs-api".to_string()
}
fn default_cache_max_entries() -> u64 {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::InMemory,
            connection_string: None,
            prefix: default_cache_prefix(),
            expiration: None,
            enabled: false,
            max_entries: default_cache_max_entries(),
        }
    }
}

/// 토큰 발급/검증 설정.
#[derive(Debug, Deserialize)]
pub struct TokenConfig {
    /// 서명 비밀 키
    #[serde(deserialize_with = "deserialize_secret")]
    pub secret_key: SecretString,
    /// 서명 알고리즘 (HS256, HS384, HS512)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// 토큰 유효 시간 (분)
    #[serde(default = "default_expiration_minutes")]
    pub expiration_minutes: i64,
    /// 만료 검증 여부
    #[serde(default = "default_true")]
    pub verify_expiration: bool,
}

fn default_algorithm() -> String {
    "HS256".to_string()
}
fn default_expiration_minutes() -> i64 {
    60
}
fn default_true() -> bool {
    true
}

/// 비밀번호 해싱(Argon2id) 파라미터.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct PasswordConfig {
    /// 메모리 비용 (KiB)
    pub memory_kib: u32,
    /// 반복 횟수
    pub iterations: u32,
    /// 병렬도
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // argon2 크레이트 기본값과 동일 (OWASP 권장 최소값)
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 목록 또는 쉼표 구분 문자열을 받습니다.
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrCsv {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match ListOrCsv::deserialize(deserializer)? {
        ListOrCsv::List(items) => items,
        ListOrCsv::Csv(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(SecretString::new(value.into()))
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = Self::builder_with_defaults()?
            // 파일에서 로드 (선택)
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(Self::environment());

        Self::finish(builder)
    }

    /// TOML 문자열에서 설정을 로드합니다. 환경 변수는 적용하지 않습니다.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let builder = Self::builder_with_defaults()?
            .add_source(config::File::from_str(toml, config::FileFormat::Toml));

        Self::finish(builder)
    }

    fn builder_with_defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?)
    }

    // 값은 문자열 그대로 두고 타입 변환은 역직렬화 단계에 맡김.
    // 비밀 값("00042" 등)이 숫자로 바뀌지 않아야 함.
    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX).separator("__")
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 설정 값 사이의 제약을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.secret_key.expose_secret().is_empty() {
            return Err(ConfigError::Invalid("token.secret_key must not be empty".into()));
        }
        if !(1..=MAX_TOKEN_EXPIRATION_MINUTES).contains(&self.token.expiration_minutes) {
            return Err(ConfigError::Invalid(format!(
                "token.expiration_minutes must be between 1 and {}",
                MAX_TOKEN_EXPIRATION_MINUTES
            )));
        }
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Invalid("cache.max_entries must be at least 1".into()));
        }
        if self.api.token.expose_secret().is_empty() {
            return Err(ConfigError::Invalid("api.token must not be empty".into()));
        }
        if self.cache.backend == CacheBackendKind::Redis && self.cache.connection_string.is_none()
        {
            return Err(ConfigError::Invalid(
                "cache.connection_string is required for the redis backend".into(),
            ));
        }
        if let Some(database) = &self.database {
            if database.pool_size == 0 {
                return Err(ConfigError::Invalid("database.pool_size must be at least 1".into()));
            }
        }
        Ok(())
    }
}
