// src/debug/mod.rs
//! Crash-forensics telemetry
//!
//! Every time a render enters or leaves a slot the pool publishes a
//! [`DebugSnapshot`] of the urls being rendered. If the process dies, the
//! last snapshot in the store names the pages that were in flight.
//!
//! - **Snapshot**: `{ts, urls}` payload
//! - **Sink**: publishing contract plus no-op and in-memory sinks
//! - **Redis Sink**: background writer to an external key-value store

pub mod redis_sink;
pub mod sink;
pub mod snapshot;

// Re-export commonly used types
pub use redis_sink::{RedisDebugSink, SinkError, SinkStats};
pub use sink::{from_config, DebugSink, MemoryDebugSink, NoopDebugSink};
pub use snapshot::DebugSnapshot;
