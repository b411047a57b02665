// src/pool/job_queue.rs
//! Unbounded FIFO hand-off between submitters and slots
//!
//! `put` appends and returns immediately. `get` suspends until a job is
//! available. Concurrent `get` callers queue on a fair mutex in front of the
//! receiver, so each arriving job goes to the longest-waiting caller.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, Mutex};

pub struct JobQueue<T> {
    tx: mpsc::UnboundedSender<T>,

    /// Fair lock: waiters are granted in the order they called `get`
    rx: Mutex<mpsc::UnboundedReceiver<T>>,

    put_count: AtomicU64,
    get_count: AtomicU64,
}

impl<T: Send> JobQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            put_count: AtomicU64::new(0),
            get_count: AtomicU64::new(0),
        }
    }

    /// Append a job to the tail (never blocks)
    pub fn put(&self, job: T) {
        // The receiver lives as long as `self`, so the channel cannot be closed here
        if self.tx.send(job).is_ok() {
            self.put_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Wait for the oldest job not yet taken
    pub async fn get(&self) -> Option<T> {
        let mut rx = self.rx.lock().await;
        let job = rx.recv().await;
        if job.is_some() {
            self.get_count.fetch_add(1, Ordering::Relaxed);
        }
        job
    }

    /// Jobs queued but not yet taken
    pub fn len(&self) -> usize {
        let puts = self.put_count.load(Ordering::Relaxed);
        let gets = self.get_count.load(Ordering::Relaxed);
        puts.saturating_sub(gets) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            put_count: self.put_count.load(Ordering::Relaxed),
            get_count: self.get_count.load(Ordering::Relaxed),
            current_size: self.len(),
        }
    }
}

impl<T: Send> Default for JobQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Queue statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Total jobs enqueued
    pub put_count: u64,

    /// Total jobs handed to a slot
    pub get_count: u64,

    /// Jobs waiting for a slot
    pub current_size: usize,
}
