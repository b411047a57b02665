// src/render/unit.rs
//! Execution unit contract
//!
//! A job carries a [`RenderFactory`]; when a slot picks the job up it builds a
//! [`RenderUnit`] from a [`RenderContext`], calls `start`, awaits `finished`,
//! and then always calls `cancel` followed by `close`.

use crate::render::network::{NetworkManager, ProxyFactory};
use crate::render::options::{ExtraParams, RenderOptions};
use crate::utils::errors::{RenderError, RenderResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Everything a render unit is constructed from
pub struct RenderContext {
    pub network_manager: Box<dyn NetworkManager>,
    pub proxy_factory: Option<Arc<dyn ProxyFactory>>,
    pub options: RenderOptions,
    pub verbosity: u8,
}

/// One render in flight
#[async_trait]
pub trait RenderUnit: Send {
    /// Kick off the render. An error here is a construction fault.
    fn start(&mut self, params: ExtraParams) -> Result<(), RenderError>;

    /// Completes when the render settles
    async fn finished(&mut self) -> RenderResult;

    /// Abandon any outstanding work. Must be a no-op once settled.
    fn cancel(&mut self) {}

    /// Release resources held by the unit
    fn close(&mut self);

    /// Label used in pool logs
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Builds the execution unit for a job
pub trait RenderFactory: Send + Sync {
    fn create(&self, ctx: RenderContext) -> Result<Box<dyn RenderUnit>, RenderError>;
}

impl<F> RenderFactory for F
where
    F: Fn(RenderContext) -> Result<Box<dyn RenderUnit>, RenderError> + Send + Sync,
{
    fn create(&self, ctx: RenderContext) -> Result<Box<dyn RenderUnit>, RenderError> {
        self(ctx)
    }
}
