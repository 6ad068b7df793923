//! [`LiveRegistry`]: the published generation behind an atomic pointer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, warn};

use super::generation::Generation;

/// Registry shared between request handlers (readers) and the reloader.
///
/// Readers take a [`snapshot`](LiveRegistry::snapshot) and keep using that
/// `Arc<Generation>` for as long as they need a consistent view. The reloader
/// builds a private generation from [`begin_generation`](LiveRegistry::begin_generation)
/// and publishes it with [`commit_generation`](LiveRegistry::commit_generation),
/// a single pointer swap, so readers never see a half-built registry.
pub struct LiveRegistry {
    current: ArcSwap<Generation>,
    next_number: AtomicU64,
}

impl LiveRegistry {
    /// Create a registry holding the empty generation 0.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Generation::new(0)),
            next_number: AtomicU64::new(1),
        }
    }

    /// Current generation (single atomic load, never blocks).
    pub fn snapshot(&self) -> Arc<Generation> {
        self.current.load_full()
    }

    pub fn generation_number(&self) -> u64 {
        self.current.load().number()
    }

    /// Start a fresh, empty generation numbered after every earlier one.
    pub fn begin_generation(&self) -> Generation {
        Generation::new(self.next_number.fetch_add(1, Ordering::Relaxed))
    }

    /// Publish `next` as the current generation.
    ///
    /// Returns false, leaving the registry untouched, when `next` is older than
    /// the generation already published.
    pub fn commit_generation(&self, next: Generation) -> bool {
        let next = Arc::new(next);
        let previous = self.current.rcu(|current| {
            if current.number() < next.number() {
                Arc::clone(&next)
            } else {
                Arc::clone(current)
            }
        });

        if previous.number() >= next.number() {
            warn!(
                current = previous.number(),
                rejected = next.number(),
                "refusing to publish a stale registry generation"
            );
            return false;
        }

        debug!(
            previous = previous.number(),
            current = next.number(),
            statements = next.statements.len(),
            "published registry generation"
        );
        true
    }
}

impl Default for LiveRegistry {
    fn default() -> Self {
        Self::new()
    }
}
