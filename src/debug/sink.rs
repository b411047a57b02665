// src/debug/sink.rs
//! Debug sink contract and in-process implementations

use crate::debug::redis_sink::RedisDebugSink;
use crate::debug::snapshot::DebugSnapshot;
use crate::utils::config::DebugSinkConfig;
use crate::utils::errors::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Best-effort recorder of the active set
///
/// `publish` is called from inside slot transitions, so it must return
/// promptly and must never fail the render that triggered it.
pub trait DebugSink: Send + Sync {
    fn publish(&self, snapshot: DebugSnapshot);
}

/// Build the sink described by `config`
pub fn from_config(config: &DebugSinkConfig) -> Result<Arc<dyn DebugSink>> {
    if !config.enabled {
        return Ok(Arc::new(NoopDebugSink));
    }
    Ok(Arc::new(RedisDebugSink::spawn(config)?))
}

/// Discards every snapshot
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDebugSink;

impl DebugSink for NoopDebugSink {
    fn publish(&self, _snapshot: DebugSnapshot) {}
}

/// Keeps every snapshot in memory, oldest first
#[derive(Debug, Default)]
pub struct MemoryDebugSink {
    snapshots: Mutex<Vec<DebugSnapshot>>,
}

impl MemoryDebugSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<DebugSnapshot> {
        self.snapshots.lock().clone()
    }

    pub fn last(&self) -> Option<DebugSnapshot> {
        self.snapshots.lock().last().cloned()
    }
}

impl DebugSink for MemoryDebugSink {
    fn publish(&self, snapshot: DebugSnapshot) {
        self.snapshots.lock().push(snapshot);
    }
}
