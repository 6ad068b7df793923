//! Filesystem-backed [`ResourceResolver`].

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::ResolveError;

use super::{compile_glob, has_glob_meta, ResourceDescriptor, ResourceResolver};

const ALL_ROOTS_PREFIX: &str = "classpath*:";
const FIRST_ROOT_PREFIX: &str = "classpath:";
const FILE_PREFIX: &str = "file:";

/// Where a location pattern is resolved.
#[derive(Debug, PartialEq, Eq)]
enum Location<'a> {
    /// Every search root, results concatenated in root order.
    AllRoots(&'a str),
    /// The first search root with at least one match.
    FirstRoot(&'a str),
    /// Relative to the working directory, or absolute.
    File(&'a str),
}

impl<'a> Location<'a> {
    fn parse(pattern: &'a str) -> Self {
        let pattern = pattern.trim();
        if let Some(rest) = pattern.strip_prefix(ALL_ROOTS_PREFIX) {
            Location::AllRoots(rest.trim_start_matches('/'))
        } else if let Some(rest) = pattern.strip_prefix(FIRST_ROOT_PREFIX) {
            Location::FirstRoot(rest.trim_start_matches('/'))
        } else if let Some(rest) = pattern.strip_prefix(FILE_PREFIX) {
            Location::File(rest)
        } else {
            Location::File(pattern)
        }
    }
}

/// Split a pattern into its literal directory prefix and the glob remainder.
///
/// `mappers/**/*.yml` → (`mappers`, `**/*.yml`); a pattern with no glob
/// characters is returned whole with an empty remainder.
fn split_base(pattern: &str) -> (PathBuf, String) {
    let mut base = if pattern.starts_with('/') {
        PathBuf::from("/")
    } else {
        PathBuf::new()
    };
    let mut segments = pattern.split('/').filter(|s| !s.is_empty()).peekable();
    while let Some(segment) = segments.next_if(|s| !has_glob_meta(s)) {
        base.push(segment);
    }
    let rest = segments.collect::<Vec<_>>().join("/");
    (base, rest)
}

/// Resolves location patterns against the filesystem.
///
/// Descriptors are identified by canonical path. Files are returned in
/// file-name order within each directory so scans are deterministic.
#[derive(Debug, Clone)]
pub struct FsResourceResolver {
    search_roots: Vec<PathBuf>,
}

impl FsResourceResolver {
    /// Create a resolver; `search_roots` back `classpath:` / `classpath*:` patterns.
    pub fn new(search_roots: Vec<PathBuf>) -> Self {
        Self { search_roots }
    }

    pub fn search_roots(&self) -> &[PathBuf] {
        &self.search_roots
    }

    /// Resolve the glob `relative` underneath `root`.
    fn resolve_under(
        &self,
        pattern: &str,
        root: &Path,
        relative: &str,
    ) -> Result<Vec<ResourceDescriptor>, ResolveError> {
        let (base, glob) = split_base(relative);
        let base = root.join(base);
        let base = if base.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            base
        };

        let io_err = |source: std::io::Error| ResolveError::Io {
            pattern: pattern.to_string(),
            source,
        };

        let matcher = if glob.is_empty() {
            None
        } else {
            Some(compile_glob(pattern, &glob)?)
        };

        if !base.exists() {
            debug!(pattern = %pattern, base = %base.display(), "location base does not exist");
            return Ok(Vec::new());
        }

        // Literal path: the file itself, or nothing.
        let Some(matcher) = matcher else {
            return if base.is_file() {
                Ok(vec![describe(&base).map_err(io_err)?])
            } else {
                Ok(Vec::new())
            };
        };
        let mut resources = Vec::new();

        for entry in WalkDir::new(&base)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| io_err(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Ok(relative_path) = path.strip_prefix(&base) else {
                continue;
            };
            if matcher.is_match(relative_path) {
                resources.push(describe(path).map_err(io_err)?);
            }
        }

        Ok(resources)
    }
}

/// Snapshot length and modification time of a file.
fn describe(path: &Path) -> std::io::Result<ResourceDescriptor> {
    let canonical = fs::canonicalize(path)?;
    let metadata = fs::metadata(&canonical)?;
    let last_modified: DateTime<Utc> = metadata.modified()?.into();
    Ok(ResourceDescriptor::new(
        canonical.display().to_string(),
        canonical,
        metadata.len(),
        last_modified,
    ))
}

impl ResourceResolver for FsResourceResolver {
    fn resolve(&self, pattern: &str) -> Result<Vec<ResourceDescriptor>, ResolveError> {
        match Location::parse(pattern) {
            Location::AllRoots(relative) => {
                let mut resources = Vec::new();
                for root in &self.search_roots {
                    resources.extend(self.resolve_under(pattern, root, relative)?);
                }
                Ok(resources)
            }
            Location::FirstRoot(relative) => {
                for root in &self.search_roots {
                    let found = self.resolve_under(pattern, root, relative)?;
                    if !found.is_empty() {
                        return Ok(found);
                    }
                }
                Ok(Vec::new())
            }
            Location::File(relative) => self.resolve_under(pattern, Path::new(""), relative),
        }
    }

    fn open(&self, resource: &ResourceDescriptor) -> std::io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(fs::File::open(&resource.location)?))
    }
}
