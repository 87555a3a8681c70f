//! 설정 로드 에러 타입.

use thiserror::Error;

/// 설정 에러.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 파일/환경 변수에서 읽거나 역직렬화하지 못함
    #[error("설정 로드 실패: {0}")]
    Load(#[from] config::ConfigError),

    /// 값 사이의 제약 위반
    #[error("잘못된 설정: {0}")]
    Invalid(String),
}
