//! Infrastructure layer for LegacyChain.
//!
//! Contains implementations of the ports defined in `legacychain-core`:
//! AES-256-GCM payload encryption with Argon2id key derivation, SHA-256
//! content hashing, the HTTP content gateway and an in-memory content store,
//! the JSON-RPC ledger client and an in-memory ledger, SQLite storage for the
//! audit log and will cache, and the configuration loader.

pub mod config;
pub mod content;
pub mod crypto;
pub mod ledger;
pub mod sqlite;
