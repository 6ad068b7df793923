//! Registry reloader: rebuilds a complete generation and publishes it.

mod core;


pub use self::core::{RegistryReloader, ReloadReport};
