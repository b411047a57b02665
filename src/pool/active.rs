// src/pool/active.rs
//! Pool-wide set of renders currently occupying a slot
//!
//! Every membership change publishes a fresh [`DebugSnapshot`] while the set
//! is still locked, so the sink sees snapshots in mutation order.
//!
//! Units enter the set through [`ActiveSet::enter`], which hands back an
//! [`ActiveGuard`]. Dropping the guard is the only way out: it removes the
//! entry, republishes, cancels and closes the unit, whatever path the slot
//! took to get there.

use crate::debug::{DebugSink, DebugSnapshot};
use crate::observability::ACTIVE_RENDERS;
use crate::render::{RenderOptions, RenderUnit};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// A job occupying a slot
#[derive(Debug, Clone)]
pub struct ActiveRender {
    pub slot: usize,
    pub uid: String,
    pub url: String,
    pub started_at: Instant,
}

impl ActiveRender {
    pub fn new(slot: usize, options: &RenderOptions) -> Self {
        Self {
            slot,
            uid: options.uid().to_string(),
            url: options.url().to_string(),
            started_at: Instant::now(),
        }
    }
}

pub struct ActiveSet {
    /// Keyed by slot: a slot holds at most one render
    renders: Mutex<BTreeMap<usize, ActiveRender>>,
    sink: Arc<dyn DebugSink>,
}

impl ActiveSet {
    pub fn new(sink: Arc<dyn DebugSink>) -> Self {
        Self {
            renders: Mutex::new(BTreeMap::new()),
            sink,
        }
    }

    /// Register a started unit; cleanup runs when the guard drops
    pub(crate) fn enter(
        &self,
        render: ActiveRender,
        unit: Box<dyn RenderUnit>,
        verbosity: u8,
    ) -> ActiveGuard<'_> {
        let slot = render.slot;
        let uid = render.uid.clone();
        self.insert(render);
        ActiveGuard {
            set: self,
            slot,
            uid,
            verbosity,
            unit,
        }
    }

    fn insert(&self, render: ActiveRender) {
        let mut renders = self.renders.lock();
        let slot = render.slot;
        let previous = renders.insert(slot, render);
        debug_assert!(previous.is_none(), "slot {} already holds a render", slot);
        self.publish(&renders);
    }

    fn remove(&self, slot: usize) -> Option<ActiveRender> {
        let mut renders = self.renders.lock();
        let removed = renders.remove(&slot);
        self.publish(&renders);
        removed
    }

    fn publish(&self, renders: &BTreeMap<usize, ActiveRender>) {
        metrics::gauge!(ACTIVE_RENDERS).set(renders.len() as f64);
        let urls = renders.values().map(|r| r.url.clone()).collect();
        self.sink.publish(DebugSnapshot::new(urls));
    }

    pub fn len(&self) -> usize {
        self.renders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.renders.lock().is_empty()
    }

    /// Urls of the active renders, ordered by slot
    pub fn urls(&self) -> Vec<String> {
        self.renders.lock().values().map(|r| r.url.clone()).collect()
    }

    pub fn renders(&self) -> Vec<ActiveRender> {
        self.renders.lock().values().cloned().collect()
    }
}

/// Scoped ownership of a running unit
pub(crate) struct ActiveGuard<'a> {
    set: &'a ActiveSet,
    slot: usize,
    uid: String,
    verbosity: u8,
    unit: Box<dyn RenderUnit>,
}

impl ActiveGuard<'_> {
    pub fn unit(&mut self) -> &mut dyn RenderUnit {
        self.unit.as_mut()
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        let label = self.unit.describe();
        if self.verbosity >= 2 {
            info!(
                target: "render_pool::pool",
                uid = %self.uid,
                slot = self.slot,
                unit = %label,
                "SLOT is closing"
            );
        }

        let removed = self.set.remove(self.slot);

        let unit = &mut self.unit;
        let released = std::panic::catch_unwind(AssertUnwindSafe(|| {
            unit.cancel();
            unit.close();
        }));
        if released.is_err() {
            error!(
                target: "render_pool::pool",
                uid = %self.uid,
                slot = self.slot,
                unit = %label,
                "render unit panicked while releasing resources"
            );
        }

        if self.verbosity >= 2 {
            let elapsed_ms = removed
                .map(|render| render.started_at.elapsed().as_millis() as u64)
                .unwrap_or_default();
            info!(
                target: "render_pool::pool",
                uid = %self.uid,
                slot = self.slot,
                unit = %label,
                elapsed_ms,
                "SLOT done"
            );
        }
    }
}
