//! 템플릿 백엔드 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # API 서버 실행
//! template-cli api start --host 0.0.0.0 --port 8000
//!
//! # 마이그레이션 적용 / 되돌리기
//! template-cli db upgrade
//! template-cli db downgrade
//! ```

use clap::{Parser, Subcommand};
use template_cli::commands::{self, api::StartOptions};
use template_core::{init_logging, LogConfig};

#[derive(Parser)]
#[command(name = "template-cli")]
#[command(about = "Template backend CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// API 서버 명령
    Api {
        #[command(subcommand)]
        command: ApiCommands,
    },

    /// 데이터베이스 마이그레이션 명령
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// 예제 명령
    Example,
}

#[derive(Subcommand)]
enum ApiCommands {
    /// API 서버 시작
    Start {
        /// 바인딩 호스트
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// 바인딩 포트
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// 모든 마이그레이션 적용
    Upgrade,

    /// 마지막 마이그레이션 되돌리기
    Downgrade {
        /// 확인 질문 생략
        #[arg(long, short)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Commands::Example = cli.command {
        println!("Example command");
        return Ok(());
    }

    let config = commands::load_config()?;
    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    match cli.command {
        Commands::Api {
            command: ApiCommands::Start { host, port },
        } => commands::api::start(config, StartOptions { host, port }).await?,
        Commands::Db {
            command: DbCommands::Upgrade,
        } => commands::db::upgrade(&config).await?,
        Commands::Db {
            command: DbCommands::Downgrade { yes },
        } => commands::db::downgrade(&config, yes).await?,
        Commands::Example => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_api_start_defaults() {
        let cli = Cli::try_parse_from(["template-cli", "api", "start"]).unwrap();
        match cli.command {
            Commands::Api {
                command: ApiCommands::Start { host, port },
            } => {
                assert_eq!(host, "0.0.0.0");
                assert_eq!(port, 8000);
            }
            _ => panic!("expected api start"),
        }
    }

    #[test]
    fn test_db_downgrade_yes_flag() {
        let cli = Cli::try_parse_from(["template-cli", "db", "downgrade", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Db {
                command: DbCommands::Downgrade { yes: true }
            }
        ));
    }
}
