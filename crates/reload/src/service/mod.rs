//! Reload service: one scan-then-reload tick over the configured locations.

mod core;


pub use self::core::{ReloadService, TickOutcome};
