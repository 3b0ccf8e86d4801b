//! Ledger port and the will registry built on it.

pub mod client;
pub mod registry;
