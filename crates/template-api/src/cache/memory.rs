//! 프로세스 메모리 캐시 백엔드.
//!
//! `moka` 캐시 위에 구성되며, 만료 시간과 최대 항목 수는 생성 시 한 번 정해집니다.
//! 만료되었거나 용량 초과로 밀려난 항목은 moka의 정리 작업이 제거합니다.

use std::time::Duration;

use moka::future::Cache;

/// 만료 시간과 용량 제한이 있는 메모리 키-값 저장소.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    entries: Cache<String, String>,
}

impl MemoryBackend {
    /// 새 백엔드를 생성합니다.
    ///
    /// # Arguments
    ///
    /// * `ttl_secs` - 항목 만료 시간 (초). None이면 용량 초과 시에만 제거.
    /// * `max_entries` - 최대 항목 수
    pub fn new(ttl_secs: Option<u64>, max_entries: u64) -> Self {
        let mut builder = Cache::builder().max_capacity(max_entries);
        if let Some(secs) = ttl_secs {
            builder = builder.time_to_live(Duration::from_secs(secs));
        }

        Self {
            entries: builder.build(),
        }
    }

    /// 값을 조회합니다. 만료된 항목은 없는 것으로 봅니다.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).await
    }

    /// 값을 저장합니다.
    pub async fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value).await;
    }

    /// 접두사로 시작하는 유효한 키를 모두 삭제하고 삭제 수를 반환합니다.
    pub async fn clear_prefix(&self, prefix: &str) -> usize {
        // iter()는 만료된 항목을 건너뜀
        let keys: Vec<_> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key)
            .collect();

        for key in &keys {
            self.entries.invalidate(key.as_str()).await;
        }
        keys.len()
    }

    /// 보관 중인 항목 수. 대기 중인 정리 작업을 먼저 수행합니다.
    pub async fn len(&self) -> usize {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count() as usize
    }
}
