// src/utils/mod.rs
//! Common utilities: configuration and error types

pub mod config;
pub mod errors;

pub use config::{DebugSinkConfig, LogFormat, LoggingSettings, PoolConfig, PoolSettings};
pub use errors::{PoolError, RenderError, RenderResult, Result};
