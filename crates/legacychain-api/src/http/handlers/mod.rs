//! REST API request handlers.

pub mod countdown;
pub mod history;
pub mod will;
