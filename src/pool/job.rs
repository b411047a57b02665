// src/pool/job.rs
//! Queued render jobs and their completion handles

use crate::render::{ExtraParams, ProxyFactory, RenderFactory, RenderOptions};
use crate::utils::errors::{RenderError, RenderResult};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// A render request waiting for, or occupying, a slot
pub struct Job {
    pub factory: Arc<dyn RenderFactory>,
    pub options: RenderOptions,
    pub proxy_factory: Option<Arc<dyn ProxyFactory>>,
    pub params: ExtraParams,
    completion: oneshot::Sender<RenderResult>,
}

impl Job {
    pub(crate) fn new(
        factory: Arc<dyn RenderFactory>,
        options: RenderOptions,
        proxy_factory: Option<Arc<dyn ProxyFactory>>,
        params: ExtraParams,
    ) -> (Self, CompletionHandle) {
        let (tx, rx) = oneshot::channel();
        let job = Self {
            factory,
            options,
            proxy_factory,
            params,
            completion: tx,
        };
        (job, CompletionHandle { rx })
    }

    pub fn uid(&self) -> &str {
        self.options.uid()
    }

    /// Split off the completion sender so the job body can be consumed
    pub(crate) fn into_parts(self) -> (JobSpec, Completion) {
        let spec = JobSpec {
            factory: self.factory,
            options: self.options,
            proxy_factory: self.proxy_factory,
            params: self.params,
        };
        (spec, Completion(self.completion))
    }
}

/// Job body without its completion sender
pub(crate) struct JobSpec {
    pub factory: Arc<dyn RenderFactory>,
    pub options: RenderOptions,
    pub proxy_factory: Option<Arc<dyn ProxyFactory>>,
    pub params: ExtraParams,
}

/// Single-assignment resolver for a job's handle
pub(crate) struct Completion(oneshot::Sender<RenderResult>);

impl Completion {
    /// Resolve the handle. Returns false if the caller stopped listening.
    pub fn resolve(self, result: RenderResult) -> bool {
        self.0.send(result).is_ok()
    }
}

/// Caller-side view of a submitted job
///
/// Resolves with the render's output or its fault. If the pool is shut down
/// before the job runs, resolves with [`RenderError::Abandoned`].
#[derive(Debug)]
pub struct CompletionHandle {
    rx: oneshot::Receiver<RenderResult>,
}

impl Future for CompletionHandle {
    type Output = RenderResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(RenderError::Abandoned)))
    }
}
