//! Unlock gate and its periodic countdown task.
//!
//! The gate is advisory for display. Execution re-evaluates it against the
//! registry's stored unlock timestamp, never a client-supplied one.

pub mod countdown;
pub mod gate;
