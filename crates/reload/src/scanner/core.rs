//! Core [`ChangeScanner`] struct: resolves patterns and diffs fingerprints.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::ResolveError;
use crate::resolver::{ResourceDescriptor, ResourceResolver};

use super::fingerprint::FingerprintStore;

/// Detects changed mapping resources between scans.
///
/// Every scan resolves all patterns before touching the store: a resolver
/// failure on any pattern leaves the store exactly as the last successful
/// scan left it. A successful scan replaces the store with what it observed,
/// so identifiers of resources that disappeared are pruned.
pub struct ChangeScanner {
    resolver: Arc<dyn ResourceResolver>,
    store: FingerprintStore,
    /// Every resource observed by the last successful scan, in scan order.
    last_seen: Vec<ResourceDescriptor>,
    /// Identifiers that vanished in the last successful scan.
    removed: Vec<String>,
}

impl ChangeScanner {
    pub fn new(resolver: Arc<dyn ResourceResolver>) -> Self {
        Self {
            resolver,
            store: FingerprintStore::new(),
            last_seen: Vec::new(),
            removed: Vec::new(),
        }
    }

    /// Populate the store from scratch.
    ///
    /// Does nothing when the store already holds fingerprints.
    pub fn initial_scan(&mut self, patterns: &[String]) -> Result<(), ResolveError> {
        if !self.store.is_empty() {
            debug!(
                tracked = self.store.len(),
                "fingerprint store already populated, skipping initial scan"
            );
            return Ok(());
        }

        let resources = self.resolve_all(patterns)?;
        info!(resources = resources.len(), "initial mapping resource scan complete");
        self.commit(resources);
        Ok(())
    }

    /// Resources whose fingerprint differs from the store, including new ones.
    ///
    /// The store is updated with every inspected resource, changed or not.
    pub fn detect_changes(
        &mut self,
        patterns: &[String],
    ) -> Result<Vec<ResourceDescriptor>, ResolveError> {
        debug!(patterns = patterns.len(), "scanning mapping resources");
        let resources = self.resolve_all(patterns)?;

        let changed: Vec<ResourceDescriptor> = resources
            .iter()
            .filter(|resource| self.store.is_changed(&resource.id, &resource.fingerprint()))
            .cloned()
            .collect();

        for resource in &changed {
            debug!(
                resource = %resource.id,
                fingerprint = %resource.fingerprint(),
                "mapping resource changed"
            );
        }

        self.commit(resources);
        for id in &self.removed {
            debug!(resource = %id, "mapping resource disappeared");
        }
        Ok(changed)
    }

    pub fn store(&self) -> &FingerprintStore {
        &self.store
    }

    pub fn last_seen(&self) -> &[ResourceDescriptor] {
        &self.last_seen
    }

    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    /// Resolve every pattern in order, keeping the first occurrence of each id.
    fn resolve_all(&self, patterns: &[String]) -> Result<Vec<ResourceDescriptor>, ResolveError> {
        let mut seen = HashSet::new();
        let mut resources = Vec::new();
        for pattern in patterns {
            for resource in self.resolver.resolve(pattern)? {
                if seen.insert(resource.id.clone()) {
                    resources.push(resource);
                }
            }
        }
        Ok(resources)
    }

    fn commit(&mut self, resources: Vec<ResourceDescriptor>) {
        let store: FingerprintStore = resources
            .iter()
            .map(|resource| (resource.id.clone(), resource.fingerprint()))
            .collect();

        self.removed = self
            .store
            .ids()
            .filter(|id| !store.contains(id))
            .map(String::from)
            .collect();
        self.removed.sort();

        self.store = store;
        self.last_seen = resources;
    }
}
