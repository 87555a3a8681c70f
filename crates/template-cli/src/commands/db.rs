//! 데이터베이스 마이그레이션 명령어.
//!
//! ```bash
//! template-cli db upgrade
//! template-cli db downgrade --yes
//! ```

use std::io::{BufRead, Write};

use anyhow::{anyhow, Result};
use template_api::db::Database;
use template_core::AppConfig;
use tracing::info;

/// 다운그레이드 확인 질문.
pub const DOWNGRADE_PROMPT: &str = "Are you sure you want to downgrade the database? (yes/no): ";

async fn connect(config: &AppConfig) -> Result<Database> {
    let settings = config
        .database
        .as_ref()
        .ok_or_else(|| anyhow!("database section is missing from the configuration"))?;

    Ok(Database::connect(settings).await?)
}

/// 대기 중인 마이그레이션을 모두 적용합니다.
pub async fn upgrade(config: &AppConfig) -> Result<()> {
    let db = connect(config).await?;
    db.migrate().await?;

    info!("Database upgraded");
    println!("Database upgraded.");
    Ok(())
}

/// 마지막 마이그레이션 하나를 되돌립니다.
///
/// `assume_yes`가 아니면 표준 입력으로 `yes` 확인을 받습니다.
pub async fn downgrade(config: &AppConfig, assume_yes: bool) -> Result<()> {
    if !assume_yes {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        if !confirm(&mut stdin.lock(), &mut stdout)? {
            println!("Downgrade aborted.");
            return Err(anyhow!("downgrade aborted"));
        }
    }

    let db = connect(config).await?;
    match db.downgrade().await? {
        Some(version) => {
            info!(version, "Database downgraded");
            println!("Reverted migration {}.", version);
        }
        None => println!("No migration to revert."),
    }
    Ok(())
}

/// 확인 질문을 출력하고 답이 `yes`(대소문자 무시)인지 확인합니다.
pub fn confirm(input: &mut impl BufRead, output: &mut impl Write) -> Result<bool> {
    output.write_all(DOWNGRADE_PROMPT.as_bytes())?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}
