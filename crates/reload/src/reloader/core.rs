//! Core [`RegistryReloader`] struct: parse a batch into a fresh generation, then swap.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde::Serialize;
use sqlmap_core::{Generation, GenerationStats, LiveRegistry};
use tracing::{debug, info, warn};

use crate::error::ReloadError;
use crate::parser::{ErrorContext, MappingParser};
use crate::resolver::{ResourceDescriptor, ResourceResolver};

/// Outcome of a successful reload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReloadReport {
    /// Number of the generation that was published.
    pub generation: u64,
    /// Resources parsed into it, in batch order.
    pub resources: Vec<String>,
    pub stats: GenerationStats,
    pub elapsed_ms: u64,
}

/// Rebuilds the managed registry collections from a batch of resources.
///
/// Nothing from the previous generation is carried over: every reload starts
/// from an empty generation, so entries of renamed or deleted definitions
/// cannot survive. The new generation only becomes visible through one
/// atomic swap once the batch is done.
pub struct RegistryReloader {
    registry: Arc<LiveRegistry>,
    resolver: Arc<dyn ResourceResolver>,
    parser: Arc<dyn MappingParser>,
    context: Mutex<ErrorContext>,
}

impl RegistryReloader {
    pub fn new(
        registry: Arc<LiveRegistry>,
        resolver: Arc<dyn ResourceResolver>,
        parser: Arc<dyn MappingParser>,
    ) -> Self {
        Self {
            registry,
            resolver,
            parser,
            context: Mutex::new(ErrorContext::new()),
        }
    }

    pub fn registry(&self) -> &Arc<LiveRegistry> {
        &self.registry
    }

    /// Current per-parse error context; empty whenever no parse is running.
    pub fn error_context(&self) -> ErrorContext {
        self.context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Parse `resources` in order into a new generation and publish it.
    ///
    /// The first resource that cannot be opened or parsed aborts the batch.
    /// The generation as it stood before that resource is still published,
    /// and the returned error names the failing resource.
    pub fn reload(&self, resources: &[ResourceDescriptor]) -> Result<ReloadReport, ReloadError> {
        let started = Instant::now();
        let mut context = self.context.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = self.registry.begin_generation();
        let mut parsed = Vec::with_capacity(resources.len());

        debug!(
            generation = next.number(),
            resources = resources.len(),
            "rebuilding registry generation"
        );

        for resource in resources {
            let checkpoint = next.clone();
            if let Err(e) = self.load_resource(resource, &mut next, &mut context) {
                warn!(
                    generation = checkpoint.number(),
                    resource = %resource.id,
                    loaded = parsed.len(),
                    error = %e,
                    "reload aborted, publishing partially rebuilt registry"
                );
                if let Err(stale) = self.publish(checkpoint) {
                    warn!(error = %stale, "partially rebuilt registry was not published");
                }
                return Err(e);
            }
            parsed.push(resource.id.clone());
        }

        let report = ReloadReport {
            generation: next.number(),
            resources: parsed,
            stats: next.stats(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        self.publish(next)?;
        info!(
            generation = report.generation,
            resources = report.resources.len(),
            statements = report.stats.statements,
            elapsed_ms = report.elapsed_ms,
            "registry reloaded"
        );
        Ok(report)
    }

    fn publish(&self, generation: Generation) -> Result<(), ReloadError> {
        let number = generation.number();
        if self.registry.commit_generation(generation) {
            Ok(())
        } else {
            Err(ReloadError::Superseded {
                generation: number,
                current: self.registry.generation_number(),
            })
        }
    }

    fn load_resource(
        &self,
        resource: &ResourceDescriptor,
        generation: &mut Generation,
        context: &mut ErrorContext,
    ) -> Result<(), ReloadError> {
        let mut scope = context.scope(&resource.id);
        let mut reader = self
            .resolver
            .open(resource)
            .map_err(|source| ReloadError::Open {
                resource: resource.id.clone(),
                source,
            })?;

        self.parser
            .parse(&mut reader, generation, &resource.id, &mut scope)
            .map_err(|source| ReloadError::Parse {
                resource: resource.id.clone(),
                source,
            })
    }
}
