// src/pool/mod.rs
//! Render slot pool
//!
//! - **Job Queue**: unbounded FIFO hand-off from submitters to slots
//! - **Job**: a queued render plus its completion handle
//! - **Active Set**: renders occupying a slot, mirrored to the debug sink
//! - **Render Pool**: the façade owning the slot tasks
//!
//! # Guarantees
//!
//! - At most `slots` renders run at once
//! - Jobs start in submission order; completion order is unspecified
//! - Every started unit is cancelled and closed exactly once
//! - A job's fault only ever reaches that job's handle

pub mod active;
pub mod job;
pub mod job_queue;
pub mod render_pool;

// Re-export commonly used types
pub use active::{ActiveRender, ActiveSet};
pub use job::{CompletionHandle, Job};
pub use job_queue::{JobQueue, QueueStats};
pub use render_pool::{PoolDeps, PoolStats, RenderPool};
