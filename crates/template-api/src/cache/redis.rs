//! Redis 캐시 백엔드.

use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisResult};
use serde_json::{Map, Value};
use tracing::info;

/// Redis 연결 래퍼.
///
/// `ConnectionManager`는 끊어진 연결을 자동으로 재연결하며 복제 비용이 낮습니다.
#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
}

impl RedisBackend {
    /// Redis에 연결합니다.
    pub async fn connect(url: &str) -> RedisResult<Self> {
        info!("Connecting to Redis...");

        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        info!("Redis connection established");

        Ok(Self { connection })
    }

    /// Redis 상태를 확인합니다.
    pub async fn health_check(&self) -> RedisResult<bool> {
        let mut conn = self.connection.clone();
        let result: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(result == "PONG")
    }

    /// 값을 조회합니다.
    pub async fn get(&self, key: &str) -> RedisResult<Option<String>> {
        let mut conn = self.connection.clone();
        conn.get(key).await
    }

    /// 값을 저장합니다. TTL이 없으면 만료 없이 저장합니다.
    pub async fn set(&self, key: &str, value: String, ttl_secs: Option<u64>) -> RedisResult<()> {
        let mut conn = self.connection.clone();
        match ttl_secs {
            Some(ttl) => conn.set_ex(key, value, ttl).await,
            None => conn.set(key, value).await,
        }
    }

    /// 접두사로 시작하는 키를 모두 삭제하고 삭제 수를 반환합니다.
    ///
    /// `KEYS` 대신 `SCAN`으로 순회하므로 서버를 오래 막지 않습니다.
    pub async fn clear_prefix(&self, prefix: &str) -> RedisResult<usize> {
        let mut conn = self.connection.clone();
        let pattern = format!("{}*", escape_glob(prefix));
        let mut cursor: u64 = 0;
        let mut deleted: usize = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let removed: i64 = conn.del(&keys).await?;
                deleted += removed as usize;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(deleted)
    }

    /// `INFO` 응답을 키-값 맵으로 반환합니다.
    pub async fn info(&self) -> RedisResult<Map<String, Value>> {
        let mut conn = self.connection.clone();
        let raw: String = redis::cmd("INFO").query_async(&mut conn).await?;
        Ok(parse_info(&raw))
    }
}

/// `SCAN` 한 번에 요청하는 키 수.
const SCAN_COUNT: usize = 100;

/// `MATCH` 패턴에서 특수 의미를 갖는 문자를 이스케이프합니다.
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `INFO` 텍스트를 파싱합니다. 섹션 헤더(`#`)와 빈 줄은 건너뜁니다.
fn parse_info(raw: &str) -> Map<String, Value> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}
