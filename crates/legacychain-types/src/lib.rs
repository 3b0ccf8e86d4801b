//! Shared domain types for LegacyChain.
//!
//! This crate contains the domain types used across the LegacyChain workspace:
//! wills, beneficiaries, lifecycle status, unlock verdicts, audit history,
//! configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod address;
pub mod config;
pub mod error;
pub mod history;
pub mod unlock;
pub mod will;
