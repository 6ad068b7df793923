//! Core [`ReloadService`] struct: wires the scanner to the reloader.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use sqlmap_core::{LiveRegistry, ReloadConfig, ReloadScope};
use tracing::{debug, info};

use crate::error::ReloadServiceError;
use crate::parser::MappingParser;
use crate::reloader::{RegistryReloader, ReloadReport};
use crate::resolver::{ResourceDescriptor, ResourceResolver};
use crate::scanner::ChangeScanner;

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// Nothing changed; the registry was left alone.
    Unchanged,
    /// A new generation was published.
    Reloaded {
        changed: Vec<String>,
        removed: Vec<String>,
        report: ReloadReport,
    },
}

/// Scans the mapper locations and reloads the registry when they changed.
///
/// The scanner is locked for the whole tick, so concurrent callers run one
/// after the other.
pub struct ReloadService {
    patterns: Vec<String>,
    scope: ReloadScope,
    scanner: Mutex<ChangeScanner>,
    reloader: RegistryReloader,
}

impl ReloadService {
    pub fn new(
        patterns: Vec<String>,
        scope: ReloadScope,
        registry: Arc<LiveRegistry>,
        resolver: Arc<dyn ResourceResolver>,
        parser: Arc<dyn MappingParser>,
    ) -> Self {
        Self {
            patterns,
            scope,
            scanner: Mutex::new(ChangeScanner::new(resolver.clone())),
            reloader: RegistryReloader::new(registry, resolver, parser),
        }
    }

    pub fn from_config(
        config: &ReloadConfig,
        registry: Arc<LiveRegistry>,
        resolver: Arc<dyn ResourceResolver>,
        parser: Arc<dyn MappingParser>,
    ) -> Self {
        Self::new(
            config.mapper_locations.clone(),
            config.scope,
            registry,
            resolver,
            parser,
        )
    }

    pub fn registry(&self) -> &Arc<LiveRegistry> {
        self.reloader.registry()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn scope(&self) -> ReloadScope {
        self.scope
    }

    /// Take the initial fingerprints and load every resource found.
    pub fn bootstrap(&self) -> Result<ReloadReport, ReloadServiceError> {
        let mut scanner = self.lock_scanner();
        scanner.initial_scan(&self.patterns)?;
        info!(
            resources = scanner.last_seen().len(),
            "loading mapping resources"
        );
        Ok(self.reloader.reload(scanner.last_seen())?)
    }

    /// Detect changes and, if there are any, reload the registry.
    ///
    /// With [`ReloadScope::All`] every resource seen by the scan is reloaded
    /// when anything changed or disappeared. With [`ReloadScope::Changed`]
    /// only the changed resources are, and removals alone do not trigger.
    pub fn tick(&self) -> Result<TickOutcome, ReloadServiceError> {
        let mut scanner = self.lock_scanner();
        let changed = scanner.detect_changes(&self.patterns)?;
        let removed = scanner.removed().to_vec();

        let triggered = match self.scope {
            ReloadScope::All => !changed.is_empty() || !removed.is_empty(),
            ReloadScope::Changed => !changed.is_empty(),
        };
        if !triggered {
            debug!(tracked = scanner.store().len(), "no mapping resource changes");
            return Ok(TickOutcome::Unchanged);
        }

        let changed_ids: Vec<String> = changed.iter().map(|r| r.id.clone()).collect();
        info!(
            changed = changed_ids.len(),
            removed = removed.len(),
            scope = %self.scope,
            "mapping resources changed, reloading"
        );

        let batch: &[ResourceDescriptor] = match self.scope {
            ReloadScope::All => scanner.last_seen(),
            ReloadScope::Changed => &changed,
        };
        let report = self.reloader.reload(batch)?;

        Ok(TickOutcome::Reloaded {
            changed: changed_ids,
            removed,
            report,
        })
    }

    /// The store only changes after a complete scan, so a tick that panicked
    /// leaves the scanner usable.
    fn lock_scanner(&self) -> MutexGuard<'_, ChangeScanner> {
        self.scanner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
