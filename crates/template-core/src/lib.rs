//! # Template Core
//!
//! 계정 API 템플릿의 공통 기반을 제공합니다:
//! - 설정 관리 (`AppConfig`)
//! - 로깅 인프라
//! - 사용자 도메인 모델

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
