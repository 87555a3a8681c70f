//! 도메인 모델.

pub mod user;

pub use user::*;
