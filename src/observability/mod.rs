//! Logging setup and sensitive-data redaction.

pub mod logging;

pub use logging::*;
