// src/debug/snapshot.rs
//! Snapshot of the renders occupying slots at one instant

use serde::{Deserialize, Serialize};

/// What is written to the debug store on every active-set change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugSnapshot {
    /// Unix seconds; lets a reader tell a crashed instance from a live one
    pub ts: i64,

    /// Target urls of the active renders, ordered by slot
    pub urls: Vec<String>,
}

impl DebugSnapshot {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            ts: chrono::Utc::now().timestamp(),
            urls,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
