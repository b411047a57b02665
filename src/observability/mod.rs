// src/observability/mod.rs
//! Tracing and metrics setup
//!
//! The library only emits through the `tracing` and `metrics` facades;
//! embedding binaries call [`init_tracing`] once at startup.

use crate::utils::config::{LogFormat, LoggingSettings};
use crate::utils::errors::{PoolError, Result};
use metrics::{describe_counter, describe_gauge, Unit};
use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const JOBS_SUBMITTED: &str = "render_pool_jobs_submitted_total";
pub const JOBS_COMPLETED: &str = "render_pool_jobs_completed_total";
pub const ACTIVE_RENDERS: &str = "render_pool_active_renders";
pub const DEBUG_PUBLISH_FAILURES: &str = "render_pool_debug_publish_failures_total";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber
pub fn init_tracing(logging: &LoggingSettings) -> Result<()> {
    describe_metrics();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| {
            PoolError::Telemetry(format!("invalid log level {:?}: {}", logging.level, e))
        })?;

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| {
            PoolError::Telemetry(format!("failed to install tracing subscriber: {}", e))
        })
}

/// Register metric descriptions with whatever recorder is installed
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(JOBS_SUBMITTED, Unit::Count, "Render jobs accepted by the pool.");
        describe_counter!(
            JOBS_COMPLETED,
            Unit::Count,
            "Render jobs settled, labelled by outcome."
        );
        describe_gauge!(
            ACTIVE_RENDERS,
            Unit::Count,
            "Render jobs currently occupying a slot."
        );
        describe_counter!(
            DEBUG_PUBLISH_FAILURES,
            Unit::Count,
            "Debug snapshot writes that failed and were dropped."
        );
    });
}
