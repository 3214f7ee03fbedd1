//! Endpoint catalogs and the per-version cache that shares them.

use crate::{version::ApiVersion, Error, Result};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, OnceLock};

/// Endpoint names used when discovery is skipped.
const CONVENTIONAL_ENDPOINTS: [&str; 6] = [
    "collections",
    "issues",
    "journals",
    "pressreleases",
    "sections",
    "uselicenses",
];

/// The endpoints available under one API version.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndpointCatalog {
    names: BTreeSet<String>,
}

impl EndpointCatalog {
    /// Creates a catalog from endpoint names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The endpoints a SciELO Manager instance conventionally exposes.
    pub fn conventional() -> Self {
        Self::new(CONVENTIONAL_ENDPOINTS)
    }

    /// Builds a catalog from the API root document, whose keys are the
    /// endpoint names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the document is not a JSON object.
    pub fn from_root_document(document: &Value) -> Result<Self> {
        let object = document.as_object().ok_or_else(|| {
            Error::Protocol(format!(
                "Expected an object listing endpoints, got: {}",
                document
            ))
        })?;
        Ok(Self::new(object.keys().cloned()))
    }

    /// Returns `true` if `name` is a known endpoint.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Iterates over endpoint names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns the number of endpoints.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the catalog lists no endpoints.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Caches one [`EndpointCatalog`] per API version.
///
/// Connectors share the process-wide instance from [`EndpointCache::global`]
/// unless a private cache is injected. Each version has its own slot: callers
/// racing on the first lookup of a version wait on that slot, store one
/// catalog and all observe it, while lookups of other versions proceed.
#[derive(Debug, Default)]
pub struct EndpointCache {
    slots: Mutex<HashMap<ApiVersion, Arc<Slot>>>,
}

type Slot = Mutex<Option<Arc<EndpointCatalog>>>;

static GLOBAL_CACHE: OnceLock<Arc<EndpointCache>> = OnceLock::new();

impl EndpointCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide cache.
    pub fn global() -> Arc<EndpointCache> {
        Arc::clone(GLOBAL_CACHE.get_or_init(|| Arc::new(EndpointCache::new())))
    }

    /// Returns the cached catalog for `version`, if any.
    ///
    /// Waits while the catalog of `version` is being fetched.
    pub fn get(&self, version: &ApiVersion) -> Result<Option<Arc<EndpointCatalog>>> {
        let slot = {
            let slots = self.slots.lock().map_err(|_| Error::CachePoisoned)?;
            match slots.get(version) {
                Some(slot) => Arc::clone(slot),
                None => return Ok(None),
            }
        };

        let catalog = slot.lock().map_err(|_| Error::CachePoisoned)?;
        Ok(catalog.clone())
    }

    /// Returns the catalog for `version`, calling `fetch` to populate it on
    /// first use.
    ///
    /// Only the slot of `version` is held during `fetch`. A failed `fetch`
    /// leaves the slot empty, so a later call tries again.
    pub fn get_or_fetch<F>(&self, version: &ApiVersion, fetch: F) -> Result<Arc<EndpointCatalog>>
    where
        F: FnOnce() -> Result<EndpointCatalog>,
    {
        let slot = {
            let mut slots = self.slots.lock().map_err(|_| Error::CachePoisoned)?;
            Arc::clone(slots.entry(version.clone()).or_default())
        };

        let mut cached = slot.lock().map_err(|_| Error::CachePoisoned)?;
        if let Some(catalog) = cached.as_ref() {
            return Ok(Arc::clone(catalog));
        }

        let catalog = Arc::new(fetch()?);
        tracing::debug!(
            version = %version,
            endpoints = catalog.len(),
            "Cached endpoint catalog"
        );
        *cached = Some(Arc::clone(&catalog));
        Ok(catalog)
    }
}
