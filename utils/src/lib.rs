//! Shared utilities for concord.

pub mod logging;

pub use logging::{init_tracing, LogFormat};
