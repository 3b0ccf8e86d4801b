//! Will lifecycle logic and port trait definitions for LegacyChain.
//!
//! This crate defines the "ports" (cipher, content store, ledger client,
//! history log, will cache, clock) that the infrastructure layer implements,
//! plus the pure pieces built on them: the unlock gate, the countdown task,
//! retry policy, the will registry and the will orchestrator. It depends only
//! on `legacychain-types` -- never on `legacychain-infra` or any IO crate.

pub mod clock;
pub mod ledger;
pub mod repository;
pub mod retry;
pub mod service;
pub mod unlock;
