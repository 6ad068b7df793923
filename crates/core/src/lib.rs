pub mod config;
pub mod error;
pub mod registry;

pub use config::{ReloadConfig, ReloadScope};
pub use error::*;
pub use registry::{Generation, GenerationStats, LiveRegistry, StrictMap};
