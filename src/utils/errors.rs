// src/utils/errors.rs
//! Error types for the render pool
//!
//! Two layers of failure are kept apart:
//!
//! - [`RenderError`]: job-level faults. They are delivered on the job's
//!   completion handle and never leave the slot that ran the job.
//! - [`PoolError`]: pool-level faults (bad configuration, missing runtime).
//!   These are returned from constructors and loaders.

use thiserror::Error;

/// Result alias for pool-level operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Result delivered on a job's completion handle
pub type RenderResult = std::result::Result<crate::render::RenderOutput, RenderError>;

/// Job-level fault, forwarded verbatim to the submitting caller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The execution unit could not be constructed or its `start` failed
    #[error("render failed to start: {0}")]
    Construction(String),

    /// The execution unit settled with a failure
    #[error("render failed: {0}")]
    Execution(String),

    /// The execution unit panicked while running
    #[error("render panicked: {0}")]
    Panicked(String),

    /// The pool went away before the job was executed
    #[error("render pool shut down before the job completed")]
    Abandoned,
}

impl RenderError {
    pub fn construction(reason: impl Into<String>) -> Self {
        Self::Construction(reason.into())
    }

    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution(reason.into())
    }

    /// Whether the fault happened before the unit was running
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::Construction(_))
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Construction(_) => "construction",
            Self::Execution(_) => "execution",
            Self::Panicked(_) => "panicked",
            Self::Abandoned => "abandoned",
        }
    }
}

/// Pool-level errors
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No tokio runtime available to drive the pool")]
    NoRuntime,

    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl PoolError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
