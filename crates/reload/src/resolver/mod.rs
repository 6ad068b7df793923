//! Resource resolution: turning location patterns into resource descriptors.
//!
//! The reload core only depends on the [`ResourceResolver`] trait. Two
//! implementations ship with the crate: [`FsResourceResolver`] for files on
//! disk and [`MemoryResourceResolver`] for documents held in memory.

mod fs;
mod memory;

#[cfg(test)]
mod tests;

use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use globset::{GlobBuilder, GlobMatcher};
use serde::Serialize;

use crate::error::ResolveError;
use crate::scanner::Fingerprint;

pub use self::fs::FsResourceResolver;
pub use self::memory::MemoryResourceResolver;

/// Snapshot of one resource taken at scan time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    /// Unique identifier within a scan (canonical path for files).
    pub id: String,
    /// Where the byte stream is read from.
    pub location: PathBuf,
    /// Size in bytes.
    pub len: u64,
    pub last_modified: DateTime<Utc>,
}

impl ResourceDescriptor {
    pub fn new(
        id: impl Into<String>,
        location: impl Into<PathBuf>,
        len: u64,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
            len,
            last_modified,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(self.len, self.last_modified)
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Enumerates and opens mapping-document resources.
pub trait ResourceResolver: Send + Sync {
    /// Current set of resources matching `pattern`.
    fn resolve(&self, pattern: &str) -> Result<Vec<ResourceDescriptor>, ResolveError>;

    /// Open the byte stream of a previously resolved resource.
    fn open(&self, resource: &ResourceDescriptor) -> std::io::Result<Box<dyn Read + Send>>;
}

/// Compile a glob where `*` stays within one path segment and `**` spans many.
pub(crate) fn compile_glob(pattern: &str, glob: &str) -> Result<GlobMatcher, ResolveError> {
    GlobBuilder::new(glob)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|source| ResolveError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}

pub(crate) fn has_glob_meta(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{'])
}
