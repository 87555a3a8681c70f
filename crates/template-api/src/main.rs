//! 계정 API 서버.
//!
//! 설정 파일 경로는 `APP_CONFIG` 환경 변수로 바꿀 수 있습니다 (기본 `config/default.toml`).

use template_api::server;
use template_core::{init_logging, AppConfig, LogConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let path = std::env::var("APP_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    let config = AppConfig::load(&path)?;

    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    server::run(config, None).await?;
    Ok(())
}
