// src/render/mod.rs
//! Render collaborators consumed by the pool
//!
//! The pool never looks inside a render. It only needs:
//!
//! - **Render Factory / Unit**: builds and drives one render per job
//! - **Network Manager Factory**: a fresh network stack per job
//! - **Proxy Selector**: turns a caller's proxy spec into proxy configuration
//! - **Render Options**: uid and target url, used for logs and debug snapshots

pub mod network;
pub mod options;
pub mod unit;

// Re-export commonly used types
pub use network::{
    FixedProxy, FixedProxySelector, NetworkManager, NetworkManagerFactory, PassThroughProxy,
    ProxyFactory, ProxySelector,
};
pub use options::{ExtraParams, RenderOptions, RenderOutput};
pub use unit::{RenderContext, RenderFactory, RenderUnit};
