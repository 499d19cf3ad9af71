//! Shared runtime utilities for the identity provider binaries.

pub mod logging;

pub use logging::{init_logging, LogFormat};
