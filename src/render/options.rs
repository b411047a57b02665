// src/render/options.rs
//! Per-job render parameters and outputs

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Execution-time arguments handed to [`RenderUnit::start`](super::RenderUnit::start)
pub type ExtraParams = serde_json::Map<String, serde_json::Value>;

/// Identity of a render request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    uid: String,
    url: String,

    /// Free-form arguments the render unit interprets
    #[serde(default)]
    pub args: serde_json::Map<String, serde_json::Value>,
}

impl RenderOptions {
    /// Options for `url` with a freshly generated uid
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_uid(ulid::Ulid::new().to_string(), url)
    }

    pub fn with_uid(uid: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            url: url.into(),
            args: serde_json::Map::new(),
        }
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Target resource; this is what debug snapshots record
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Successful render result
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutput {
    Html(String),
    Png(Bytes),
    Json(serde_json::Value),
}
