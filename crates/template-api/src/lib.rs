//! 계정 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (회원가입, 로그인, 내 계정)
//! - 비밀번호 해싱 및 액세스 토큰 인증
//! - 응답 캐시 (메모리 또는 Redis)
//! - 헬스 체크 및 Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 비밀번호, 토큰, 인증 추출기
//! - [`services`]: 계정 비즈니스 로직
//! - [`repository`]: 계정 저장소 (PostgreSQL, 메모리)
//! - [`cache`]: 응답 캐시
//! - [`db`]: 연결 풀과 마이그레이션
//! - [`server`]: 서버 조립 및 실행

pub mod auth;
pub mod cache;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;

pub use auth::{ApiTokenAuth, AuthError, Claims, JwtAuth, PasswordHasher, TokenService};
pub use error::{ApiErrorResponse, ApiJson, ApiResult};
pub use server::{build_state, create_router, run, ServerError};
pub use state::AppState;
