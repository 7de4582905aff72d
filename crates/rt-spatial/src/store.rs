//! Lazily loaded, process-wide road network.
//!
//! # Load order
//!
//! 1. In-memory copy (after the first successful load).
//! 2. Persisted JSON file, if one is configured and readable.
//! 3. The [`MapSource`]; the result is persisted best-effort.
//!
//! Every path runs [`prepare`] so the cached graph is always normalized and
//! weakly connected.  Concurrent first calls are serialized by a mutex: one
//! thread loads, the others wait and then see the cached value.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{info, warn};

use crate::components::largest_component;
use crate::network::RoadNetwork;
use crate::persist::{load_network, save_network};
use crate::source::MapSource;
use crate::speeds::ensure_speeds;
use crate::{SpatialError, SpatialResult};

/// Normalize speeds and keep the largest component.
pub fn prepare(network: RoadNetwork, fallback_kph: f64) -> RoadNetwork {
    let mut network = largest_component(&network);
    ensure_speeds(&mut network, fallback_kph);
    network
}

/// At-most-once loader for the base road network.
pub struct GraphStore<S> {
    source:       S,
    cache_path:   Option<PathBuf>,
    fallback_kph: f64,
    graph:        OnceLock<Arc<RoadNetwork>>,
    init:         Mutex<()>,
}

impl<S: MapSource> GraphStore<S> {
    pub fn new(source: S, fallback_kph: f64) -> Self {
        Self {
            source,
            cache_path: None,
            fallback_kph,
            graph: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// Read from / write to `path` around the map source.
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_loaded(&self) -> bool {
        self.graph.get().is_some()
    }

    /// The base network, loading it on first use.
    ///
    /// A failed load leaves the store empty, so a later call retries.
    pub fn load(&self) -> SpatialResult<Arc<RoadNetwork>> {
        if let Some(g) = self.graph.get() {
            return Ok(Arc::clone(g));
        }

        // A poisoned lock only means another loader panicked; the OnceLock
        // is still either empty or fully set.
        let _guard = self.init.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(g) = self.graph.get() {
            return Ok(Arc::clone(g));
        }

        let network = Arc::new(self.load_uncached()?);
        info!(nodes = network.node_count(), edges = network.edge_count(), "road network ready");
        Ok(Arc::clone(self.graph.get_or_init(|| network)))
    }

    fn load_uncached(&self) -> SpatialResult<RoadNetwork> {
        if let Some(path) = &self.cache_path {
            match load_network(path) {
                Ok(net) if !net.is_empty() => {
                    info!(path = %path.display(), "loaded road network from cache");
                    return Ok(prepare(net, self.fallback_kph));
                }
                Ok(_) => warn!(path = %path.display(), "cached road network is empty, rebuilding"),
                Err(SpatialError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    info!(path = %path.display(), "no cached road network");
                }
                Err(e) => warn!(path = %path.display(), error = %e, "cached road network unusable, rebuilding"),
            }
        }

        info!(source = %self.source.describe(), "fetching road network");
        let raw = self.source.fetch()?;
        let network = prepare(raw, self.fallback_kph);
        if network.is_empty() {
            return Err(SpatialError::EmptyNetwork);
        }

        if let Some(path) = &self.cache_path {
            // Best effort: the in-memory graph is already usable.
            if let Err(e) = save_network(&network, path) {
                warn!(path = %path.display(), error = %e, "failed to persist road network");
            }
        }
        Ok(network)
    }
}
