//! In-memory [`ResourceResolver`] for documents that do not live on disk.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::error::ResolveError;

use super::{compile_glob, ResourceDescriptor, ResourceResolver};

#[derive(Debug, Clone)]
struct MemoryResource {
    bytes: Arc<[u8]>,
    last_modified: DateTime<Utc>,
}

/// Resolver over a mutable set of named in-memory documents.
///
/// Patterns are globs matched against the document identifiers, e.g.
/// `mappers/**/*.yml`. Identifiers are returned in lexical order.
#[derive(Debug, Default)]
pub struct MemoryResourceResolver {
    resources: RwLock<BTreeMap<String, MemoryResource>>,
}

impl MemoryResourceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document.
    pub fn put(
        &self,
        id: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        last_modified: DateTime<Utc>,
    ) {
        let resource = MemoryResource {
            bytes: Arc::from(bytes.into()),
            last_modified,
        };
        self.resources
            .write()
            .expect("memory resources lock poisoned")
            .insert(id.into(), resource);
    }

    /// Change only the modification time of an existing document.
    pub fn touch(&self, id: &str, last_modified: DateTime<Utc>) -> bool {
        match self
            .resources
            .write()
            .expect("memory resources lock poisoned")
            .get_mut(id)
        {
            Some(resource) => {
                resource.last_modified = last_modified;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: &str) -> bool {
        self.resources
            .write()
            .expect("memory resources lock poisoned")
            .remove(id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.resources
            .read()
            .expect("memory resources lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceResolver for MemoryResourceResolver {
    fn resolve(&self, pattern: &str) -> Result<Vec<ResourceDescriptor>, ResolveError> {
        let matcher = compile_glob(pattern, pattern.trim())?;
        let resources = self
            .resources
            .read()
            .expect("memory resources lock poisoned");

        Ok(resources
            .iter()
            .filter(|(id, _)| matcher.is_match(id.as_str()))
            .map(|(id, resource)| {
                ResourceDescriptor::new(
                    id.clone(),
                    id.clone(),
                    resource.bytes.len() as u64,
                    resource.last_modified,
                )
            })
            .collect())
    }

    fn open(&self, resource: &ResourceDescriptor) -> std::io::Result<Box<dyn Read + Send>> {
        let resources = self
            .resources
            .read()
            .expect("memory resources lock poisoned");
        let found = resources.get(&resource.id).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no in-memory resource '{}'", resource.id),
            )
        })?;
        Ok(Box::new(Cursor::new(Arc::clone(&found.bytes))))
    }
}
