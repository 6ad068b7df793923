//! [`Generation`]: one complete, internally consistent snapshot of the registry.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::LookupError;

use super::entry::{
    CacheEntry, KeyGenerator, MappedStatement, ParameterMap, ResultMap, SqlFragment,
};
use super::strict_map::StrictMap;

/// The six managed collections plus the set of loaded resource identifiers.
///
/// A generation is built privately by the reloader and becomes visible to
/// readers only once it is committed to the [`LiveRegistry`](super::LiveRegistry);
/// committed generations are never mutated again.
#[derive(Debug, Clone)]
pub struct Generation {
    number: u64,
    built_at: DateTime<Utc>,
    pub statements: StrictMap<Arc<MappedStatement>>,
    pub caches: StrictMap<Arc<CacheEntry>>,
    pub result_maps: StrictMap<Arc<ResultMap>>,
    pub parameter_maps: StrictMap<Arc<ParameterMap>>,
    pub key_generators: StrictMap<Arc<KeyGenerator>>,
    pub fragments: StrictMap<Arc<SqlFragment>>,
    loaded_resources: BTreeSet<String>,
}

/// Entry counts of a generation, for logs and status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    pub generation: u64,
    pub built_at: DateTime<Utc>,
    pub statements: usize,
    pub caches: usize,
    pub result_maps: usize,
    pub parameter_maps: usize,
    pub key_generators: usize,
    pub fragments: usize,
    pub resources: usize,
}

impl Generation {
    /// Create an empty generation with the given sequence number.
    pub fn new(number: u64) -> Self {
        Self {
            number,
            built_at: Utc::now(),
            statements: StrictMap::new("Mapped Statements"),
            caches: StrictMap::new("Caches"),
            result_maps: StrictMap::new("Result Maps"),
            parameter_maps: StrictMap::new("Parameter Maps"),
            key_generators: StrictMap::new("Key Generators"),
            fragments: StrictMap::new("SQL Fragments"),
            loaded_resources: BTreeSet::new(),
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn statement(&self, name: &str) -> Result<&MappedStatement, LookupError> {
        self.statements.get(name).map(Arc::as_ref)
    }

    pub fn cache(&self, namespace: &str) -> Result<&CacheEntry, LookupError> {
        self.caches.get(namespace).map(Arc::as_ref)
    }

    pub fn result_map(&self, name: &str) -> Result<&ResultMap, LookupError> {
        self.result_maps.get(name).map(Arc::as_ref)
    }

    pub fn parameter_map(&self, name: &str) -> Result<&ParameterMap, LookupError> {
        self.parameter_maps.get(name).map(Arc::as_ref)
    }

    pub fn key_generator(&self, name: &str) -> Result<&KeyGenerator, LookupError> {
        self.key_generators.get(name).map(Arc::as_ref)
    }

    pub fn fragment(&self, name: &str) -> Result<&SqlFragment, LookupError> {
        self.fragments.get(name).map(Arc::as_ref)
    }

    pub fn is_resource_loaded(&self, resource: &str) -> bool {
        self.loaded_resources.contains(resource)
    }

    /// Record a resource as loaded; returns false if it already was.
    pub fn add_loaded_resource(&mut self, resource: impl Into<String>) -> bool {
        self.loaded_resources.insert(resource.into())
    }

    pub fn loaded_resources(&self) -> impl Iterator<Item = &str> {
        self.loaded_resources.iter().map(String::as_str)
    }

    pub fn stats(&self) -> GenerationStats {
        GenerationStats {
            generation: self.number,
            built_at: self.built_at,
            statements: self.statements.len(),
            caches: self.caches.len(),
            result_maps: self.result_maps.len(),
            parameter_maps: self.parameter_maps.len(),
            key_generators: self.key_generators.len(),
            fragments: self.fragments.len(),
            resources: self.loaded_resources.len(),
        }
    }
}
