//! API 서버 실행 명령어.
//!
//! ```bash
//! template-cli api start --host 127.0.0.1 --port 8080
//! ```

use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use template_core::AppConfig;
use tracing::info;

/// 서버 시작 옵션.
#[derive(Debug, Clone)]
pub struct StartOptions {
    pub host: String,
    pub port: u16,
}

impl StartOptions {
    /// 바인딩 주소 파싱.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid host: {}", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// API 서버를 실행하고 종료 신호까지 대기합니다.
pub async fn start(config: AppConfig, options: StartOptions) -> Result<()> {
    let addr = options.socket_addr()?;
    info!(%addr, "Starting API server from CLI");

    template_api::run(config, Some(addr)).await?;
    Ok(())
}
