use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::RelistError;
use crate::local::LocalAdapter;
use crate::snapshot::Snapshot;
use crate::traits::Adapter;

/// Split `scheme://path` into `("scheme://", "path")`.
pub fn split_url(url: &str) -> Option<(&str, &str)> {
    let idx = url.find("://")?;
    Some(url.split_at(idx + 3))
}

/// Resolves the [`Adapter`] responsible for a buffer URL by its scheme.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    /// An empty registry. Every URL fails to resolve.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with [`LocalAdapter`] under `file://`.
    pub fn with_local() -> Self {
        Self::new().register(LocalAdapter::SCHEME, LocalAdapter)
    }

    /// Register `adapter` for URLs starting with `scheme` (e.g. `"sftp://"`).
    pub fn register(mut self, scheme: impl Into<String>, adapter: impl Adapter + 'static) -> Self {
        self.adapters.insert(scheme.into(), Arc::new(adapter));
        self
    }

    /// The adapter for `url` and the path part of the URL.
    pub fn resolve<'u>(&self, url: &'u str) -> Option<(Arc<dyn Adapter>, &'u str)> {
        let (scheme, path) = split_url(url)?;
        let adapter = self.adapters.get(scheme)?;
        Some((Arc::clone(adapter), path))
    }

    /// List `url` through its adapter and replace the snapshot's view of it.
    ///
    /// Returns the number of children now cached for `url`.
    pub fn refresh(&self, snapshot: &mut Snapshot, url: &str) -> Result<usize, RelistError> {
        let (adapter, path) = self
            .resolve(url)
            .ok_or_else(|| RelistError::UnknownDirectory(url.to_string()))?;
        let listed = adapter.list(path)?;
        debug!(url, adapter = adapter.name(), children = listed.len(), "refreshing snapshot");
        Ok(snapshot.populate(url, listed).len())
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemes: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        f.debug_struct("AdapterRegistry").field("schemes", &schemes).finish()
    }
}
