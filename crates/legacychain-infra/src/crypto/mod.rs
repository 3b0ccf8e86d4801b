//! Cryptographic operations for LegacyChain.
//!
//! - `hash`: SHA-256 content addressing
//! - `payload`: AES-256-GCM encryption of will payloads

pub mod hash;
pub mod payload;
