// src/render/network.rs
//! Network collaborators injected into every render unit
//!
//! Both are opaque to the pool: it builds a fresh network manager per job and
//! resolves the caller's proxy spec once at submission time.

use std::fmt;
use std::sync::Arc;

/// Opaque per-job network stack
pub trait NetworkManager: Send {}

/// Builds a fresh [`NetworkManager`] for each job
pub trait NetworkManagerFactory: Send + Sync {
    fn create(&self) -> Box<dyn NetworkManager>;
}

impl<F> NetworkManagerFactory for F
where
    F: Fn() -> Box<dyn NetworkManager> + Send + Sync,
{
    fn create(&self) -> Box<dyn NetworkManager> {
        self()
    }
}

/// Proxy configuration resolved for one job
pub trait ProxyFactory: Send + Sync + fmt::Debug {
    /// Proxy to use for a request to `url`, if any
    fn proxy_for(&self, url: &str) -> Option<String>;
}

/// Turns a caller-supplied proxy spec into a [`ProxyFactory`]
pub trait ProxySelector: Send + Sync {
    fn select(&self, proxy: Option<&str>) -> Option<Arc<dyn ProxyFactory>>;
}

/// Selector used when no proxy support is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughProxy;

impl ProxySelector for PassThroughProxy {
    fn select(&self, _proxy: Option<&str>) -> Option<Arc<dyn ProxyFactory>> {
        None
    }
}

/// Routes every request through one fixed proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedProxy {
    pub address: String,
}

impl ProxyFactory for FixedProxy {
    fn proxy_for(&self, _url: &str) -> Option<String> {
        Some(self.address.clone())
    }
}

/// Selector treating the proxy spec as a literal proxy address
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedProxySelector;

impl ProxySelector for FixedProxySelector {
    fn select(&self, proxy: Option<&str>) -> Option<Arc<dyn ProxyFactory>> {
        let address = proxy.filter(|p| !p.is_empty())?;
        Some(Arc::new(FixedProxy {
            address: address.to_string(),
        }))
    }
}
