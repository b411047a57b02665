// src/pool/render_pool.rs
//! Fixed-size render slot pool
//!
//! A pool of renders. The number of slots caps how many renders run in
//! parallel; everything submitted beyond that waits in an unbounded FIFO
//! queue.
//!
//! # Architecture
//!
//! ```text
//! submit() ──put──▶ JobQueue ──get──▶ slot 0 ─┐
//!                      │      ──get──▶ slot 1 ─┼─▶ ActiveSet ──▶ DebugSink
//!                      │      ──get──▶ slot N ─┘
//!                      ▼
//!              CompletionHandle ◀── resolved after cleanup
//! ```
//!
//! Each slot is a tokio task looping `Idle → Starting → Running → Closing`.
//! Job faults (a failing factory or `start`, a failed or panicking render)
//! are delivered on that job's handle and the slot goes back to `Idle`.

use crate::debug::{self, DebugSink, NoopDebugSink};
use crate::observability::{JOBS_COMPLETED, JOBS_SUBMITTED};
use crate::pool::active::{ActiveRender, ActiveSet};
use crate::pool::job::{CompletionHandle, Job, JobSpec};
use crate::pool::job_queue::JobQueue;
use crate::render::{
    ExtraParams, NetworkManagerFactory, PassThroughProxy, ProxySelector, RenderContext,
    RenderFactory, RenderOptions,
};
use crate::utils::config::{PoolConfig, PoolSettings};
use crate::utils::errors::{PoolError, RenderError, RenderResult, Result};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// External collaborators the pool is built from
pub struct PoolDeps {
    pub network_manager_factory: Arc<dyn NetworkManagerFactory>,

    /// Proxy spec resolver; [`PassThroughProxy`] when `None`
    pub proxy_selector: Option<Arc<dyn ProxySelector>>,

    pub debug_sink: Arc<dyn DebugSink>,
}

impl PoolDeps {
    pub fn new(network_manager_factory: Arc<dyn NetworkManagerFactory>) -> Self {
        Self {
            network_manager_factory,
            proxy_selector: None,
            debug_sink: Arc::new(NoopDebugSink),
        }
    }

    pub fn with_proxy_selector(mut self, selector: Arc<dyn ProxySelector>) -> Self {
        self.proxy_selector = Some(selector);
        self
    }

    pub fn with_debug_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.debug_sink = sink;
        self
    }
}

/// State shared by the façade and every slot task
struct PoolShared {
    queue: JobQueue<Job>,
    active: ActiveSet,
    network_manager_factory: Arc<dyn NetworkManagerFactory>,
    verbosity: u8,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Bounded-concurrency render pool
pub struct RenderPool {
    config: PoolConfig,
    shared: Arc<PoolShared>,
    proxy_selector: Arc<dyn ProxySelector>,
    slots: Vec<JoinHandle<()>>,
}

impl RenderPool {
    /// Create the pool and start its slots on the current tokio runtime
    pub fn new(config: PoolConfig, deps: PoolDeps) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| PoolError::NoRuntime)?;

        let shared = Arc::new(PoolShared {
            queue: JobQueue::new(),
            active: ActiveSet::new(deps.debug_sink),
            network_manager_factory: deps.network_manager_factory,
            verbosity: config.verbosity,
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        });

        let slots = (0..config.slots)
            .map(|slot| runtime.spawn(run_slot(Arc::clone(&shared), slot)))
            .collect();

        info!(target: "render_pool::pool", slots = config.slots, "render pool started");

        Ok(Self {
            config,
            shared,
            proxy_selector: deps
                .proxy_selector
                .unwrap_or_else(|| Arc::new(PassThroughProxy)),
            slots,
        })
    }

    /// Create the pool from loaded settings, including its debug sink
    pub fn from_settings(
        settings: &PoolSettings,
        network_manager_factory: Arc<dyn NetworkManagerFactory>,
        proxy_selector: Option<Arc<dyn ProxySelector>>,
    ) -> Result<Self> {
        settings.validate()?;
        let sink = debug::from_config(&settings.debug)?;
        let mut deps = PoolDeps::new(network_manager_factory).with_debug_sink(sink);
        deps.proxy_selector = proxy_selector;
        Self::new(settings.pool.clone(), deps)
    }

    /// Queue a render; the returned handle resolves once it has run
    pub fn submit(
        &self,
        factory: Arc<dyn RenderFactory>,
        options: RenderOptions,
        proxy: Option<&str>,
        params: ExtraParams,
    ) -> CompletionHandle {
        let proxy_factory = self.proxy_selector.select(proxy);
        let (job, handle) = Job::new(factory, options, proxy_factory, params);
        let uid = job.uid().to_string();

        self.shared.queue.put(job);
        metrics::counter!(JOBS_SUBMITTED).increment(1);

        if self.shared.verbosity >= 2 {
            info!(target: "render_pool::pool", uid = %uid, "queued");
        }
        handle
    }

    pub fn slots(&self) -> usize {
        self.config.slots
    }

    pub fn active_count(&self) -> usize {
        self.shared.active.len()
    }

    /// Urls currently being rendered, ordered by slot
    pub fn active_urls(&self) -> Vec<String> {
        self.shared.active.urls()
    }

    pub fn active_renders(&self) -> Vec<ActiveRender> {
        self.shared.active.renders()
    }

    pub fn stats(&self) -> PoolStats {
        let queue = self.shared.queue.stats();
        PoolStats {
            slots: self.config.slots,
            active: self.shared.active.len(),
            queued: queue.current_size,
            submitted: queue.put_count,
            dequeued: queue.get_count,
            completed: self.shared.completed.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
        }
    }

    /// Stop every slot. Running renders are released; queued jobs resolve
    /// with [`RenderError::Abandoned`].
    pub async fn shutdown(mut self) {
        info!(target: "render_pool::pool", "shutting down render pool");
        for handle in &self.slots {
            handle.abort();
        }
        for handle in self.slots.drain(..) {
            let _ = handle.await;
        }
    }
}

impl Drop for RenderPool {
    fn drop(&mut self) {
        for handle in &self.slots {
            handle.abort();
        }
    }
}

/// Pool statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub slots: usize,
    pub active: usize,
    pub queued: usize,
    pub submitted: u64,
    /// Jobs handed to a slot so far
    pub dequeued: u64,
    pub completed: u64,
    pub failed: u64,
}

async fn run_slot(shared: Arc<PoolShared>, slot: usize) {
    loop {
        let Some(job) = shared.queue.get().await else {
            break;
        };
        let (spec, completion) = job.into_parts();
        let uid = spec.options.uid().to_string();

        let result = match AssertUnwindSafe(shared.execute(slot, spec))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(RenderError::Panicked(panic_message(panic.as_ref()))),
        };

        shared.record_outcome(slot, &uid, &result);
        completion.resolve(result);

        if shared.verbosity >= 2 {
            info!(target: "render_pool::pool", slot, "SLOT is available");
        }
    }
}

impl PoolShared {
    /// One job from `Starting` to `Closing`; the guard handles `Closing`
    async fn execute(&self, slot: usize, spec: JobSpec) -> RenderResult {
        let JobSpec {
            factory,
            options,
            proxy_factory,
            params,
        } = spec;
        if self.verbosity >= 2 {
            info!(target: "render_pool::pool", slot, "initializing SLOT");
        }

        let render = ActiveRender::new(slot, &options);
        let ctx = RenderContext {
            network_manager: self.network_manager_factory.create(),
            proxy_factory,
            options,
            verbosity: self.verbosity,
        };
        let unit = factory.create(ctx).map_err(into_construction)?;

        let uid = render.uid.clone();
        let mut guard = self.active.enter(render, unit, self.verbosity);

        if self.verbosity >= 2 {
            info!(target: "render_pool::pool", uid = %uid, slot, "SLOT is starting");
        }
        guard.unit().start(params).map_err(into_construction)?;
        if self.verbosity >= 2 {
            info!(target: "render_pool::pool", uid = %uid, slot, "SLOT is working");
        }

        let result = guard.unit().finished().await;
        // Closing: release before the caller sees the result
        drop(guard);
        result
    }

    fn record_outcome(&self, slot: usize, uid: &str, result: &RenderResult) {
        let outcome = match result {
            Ok(_) => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                "ok"
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                match e {
                    RenderError::Construction(_) | RenderError::Panicked(_) => {
                        error!(
                            target: "render_pool::pool",
                            uid,
                            slot,
                            error = %e,
                            "SLOT finished with an error"
                        );
                    }
                    _ => {
                        warn!(
                            target: "render_pool::pool",
                            uid,
                            slot,
                            error = %e,
                            "SLOT finished with an error"
                        );
                    }
                }
                e.kind()
            }
        };
        metrics::counter!(JOBS_COMPLETED, "outcome" => outcome).increment(1);
    }
}

fn into_construction(err: RenderError) -> RenderError {
    match err {
        RenderError::Construction(_) => err,
        other => RenderError::Construction(other.to_string()),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
