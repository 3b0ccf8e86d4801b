//! Business logic services (use cases).
//!
//! Services orchestrate the ports defined in this crate. They depend on
//! traits, never on concrete infrastructure implementations.

pub mod cipher;
pub mod content;
pub mod validation;
pub mod will;
