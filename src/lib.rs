// src/lib.rs
//! Render Pool Library
//!
//! A bounded-concurrency execution pool for render jobs: a fixed number of
//! slots pull jobs from a shared FIFO queue and run them one at a time, while
//! the set of in-flight renders is mirrored to an external store for crash
//! forensics.
//!
//! # Architecture
//!
//! - **pool**: job queue, slot loop, active set and the [`RenderPool`] façade
//! - **render**: collaborator traits the pool drives (units, factories, proxies)
//! - **debug**: best-effort debug snapshot sinks
//! - **observability**: tracing subscriber and metric descriptions
//! - **utils**: configuration and error types
//!
//! # Example
//!
//! ```no_run
//! use render_pool::{PoolConfig, PoolDeps, RenderOptions, RenderPool};
//! # use render_pool::render::{NetworkManager, RenderFactory};
//! # use std::sync::Arc;
//! # struct Net;
//! # impl NetworkManager for Net {}
//! # async fn run(factory: Arc<dyn RenderFactory>) -> render_pool::Result<()> {
//! let deps = PoolDeps::new(Arc::new(|| Box::new(Net) as Box<dyn NetworkManager>));
//! let pool = RenderPool::new(PoolConfig::with_slots(4), deps)?;
//!
//! let handle = pool.submit(
//!     factory,
//!     RenderOptions::new("http://example.com"),
//!     None,
//!     Default::default(),
//! );
//! let output = handle.await;
//! # Ok(())
//! # }
//! ```

// Public module exports
pub mod debug;
pub mod observability;
pub mod pool;
pub mod render;
pub mod utils;

// Re-export commonly used types
pub use debug::{DebugSink, DebugSnapshot, RedisDebugSink};
pub use pool::{CompletionHandle, PoolDeps, PoolStats, RenderPool};
pub use render::{ExtraParams, RenderOptions, RenderOutput, RenderUnit};
pub use utils::config::{PoolConfig, PoolSettings};
pub use utils::errors::{PoolError, RenderError, RenderResult, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
