//! Entry types stored in the six managed registry collections.

use serde::{Deserialize, Serialize};

/// Common accessors for anything the registry stores per declared name.
pub trait MappingEntry {
    /// Fully qualified name (`namespace.id`).
    fn id(&self) -> &str;
    /// Identifier of the resource the entry was parsed from.
    fn resource(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedStatement {
    pub id: String,
    pub kind: StatementKind,
    /// SQL text with fragment includes already expanded.
    pub sql: String,
    pub parameter_type: Option<String>,
    pub result_type: Option<String>,
    pub result_map: Option<String>,
    pub parameter_map: Option<String>,
    pub key_generator: Option<String>,
    pub use_cache: bool,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    /// Caches are keyed by namespace.
    pub id: String,
    pub eviction: String,
    pub flush_interval_ms: Option<u64>,
    pub size: Option<usize>,
    pub read_only: bool,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMapping {
    pub property: String,
    pub column: String,
    pub id: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultMap {
    pub id: String,
    pub type_name: String,
    pub mappings: Vec<ResultMapping>,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterMap {
    pub id: String,
    pub type_name: String,
    pub parameters: Vec<String>,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyGenerator {
    pub id: String,
    pub key_property: String,
    pub sql: String,
    /// Runs before the owning insert when true, after it otherwise.
    pub before: bool,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlFragment {
    pub id: String,
    pub sql: String,
    pub resource: String,
}

macro_rules! impl_mapping_entry {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MappingEntry for $ty {
                fn id(&self) -> &str {
                    &self.id
                }

                fn resource(&self) -> &str {
                    &self.resource
                }
            }
        )*
    };
}

impl_mapping_entry!(
    MappedStatement,
    CacheEntry,
    ResultMap,
    ParameterMap,
    KeyGenerator,
    SqlFragment,
);
