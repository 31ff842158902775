//! # Pool Configuration
//!
//! The serializable subset of pool configuration, loadable from TOML. The
//! container factory is code, not data, so [`PoolSettings`] converts into
//! [`PoolOptions`] with the default thread-backed factory; embedders that
//! inject their own factory build `PoolOptions` directly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::container::{ThreadContainerFactory, DEFAULT_CHANNEL_DEPTH};
use crate::pool::{PoolOptions, DEFAULT_LOCATOR};
use crate::registry::ActorRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Maximum number of containers; fixed for the pool's lifetime.
    pub capacity: usize,
    /// Name prefix for container threads.
    pub locator: String,
    /// Depth of each container's request and callback channels.
    pub channel_depth: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            capacity: 1,
            locator: DEFAULT_LOCATOR.to_string(),
            channel_depth: DEFAULT_CHANNEL_DEPTH,
        }
    }
}

impl PoolSettings {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pool settings from {}", path.display()))?;
        let settings: PoolSettings = toml::from_str(&content)
            .with_context(|| format!("failed to parse pool settings from {}", path.display()))?;
        debug!("Loaded pool settings: {:?}", settings);
        Ok(settings)
    }

    /// Builds pool options with the default thread-backed factory and the
    /// global registry.
    pub fn into_options(self) -> PoolOptions {
        self.into_options_with_registry(ActorRegistry::global())
    }

    pub fn into_options_with_registry(self, registry: Arc<ActorRegistry>) -> PoolOptions {
        PoolOptions {
            capacity: self.capacity,
            locator: self.locator,
            factory: Arc::new(ThreadContainerFactory {
                channel_depth: self.channel_depth,
            }),
            registry,
        }
    }
}
