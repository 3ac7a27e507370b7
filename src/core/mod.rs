//! Core constants and error types (no I/O).

mod constants;
mod error;

pub use constants::*;
pub use error::*;
