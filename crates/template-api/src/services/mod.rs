//! 비즈니스 로직 서비스.

pub mod accounts;

pub use accounts::{AccountError, AccountService};
