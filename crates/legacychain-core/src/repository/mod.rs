//! Repository trait definitions.
//!
//! Implementations live in legacychain-infra (SQLite). Uses native async fn
//! in traits (Rust 2024 edition, no async_trait macro).

pub mod cache;
pub mod history;
