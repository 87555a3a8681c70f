//! CLI 명령어 구현 모듈.

pub mod api;
pub mod db;

use anyhow::Result;
use template_core::AppConfig;

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 설정 로드 (`APP_CONFIG` 환경 변수가 있으면 그 경로 사용).
pub fn load_config() -> Result<AppConfig> {
    let path = std::env::var("APP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    Ok(AppConfig::load(&path)?)
}
