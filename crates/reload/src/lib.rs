//! Live reload of SQL mapping documents.
//!
//! This crate provides:
//! - Resource resolution for glob-like and `classpath*:` location patterns
//! - Fingerprint-based change detection (length + modification time)
//! - A registry reloader that rebuilds a complete generation and swaps it in
//! - A reference YAML mapping-document parser
//! - A single-flight background poller driving scan → reload

pub mod error;
pub mod parser;
pub mod poller;
pub mod reloader;
pub mod resolver;
pub mod scanner;
pub mod service;

pub use error::{ParseError, ReloadError, ReloadServiceError, ResolveError};
pub use parser::{ErrorContext, MappingParser, YamlMappingParser};
pub use poller::Poller;
pub use reloader::{RegistryReloader, ReloadReport};
pub use resolver::{
    FsResourceResolver, MemoryResourceResolver, ResourceDescriptor, ResourceResolver,
};
pub use scanner::{ChangeScanner, Fingerprint, FingerprintStore};
pub use service::{ReloadService, TickOutcome};
