//! CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - API 서버 실행
//! - 데이터베이스 마이그레이션 (업그레이드/다운그레이드)

pub mod commands;
