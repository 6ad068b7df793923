//! Serde types for the YAML mapping-document format.
//!
//! ```yaml
//! namespace: shop.UserMapper
//! cache:
//!   eviction: LRU
//!   size: 512
//! sql:
//!   - id: columns
//!     sql: id, name, email
//! resultMaps:
//!   - id: userMap
//!     type: shop.User
//!     mappings:
//!       - { property: id, column: id, id: true }
//! statements:
//!   - id: findById
//!     kind: select
//!     resultMap: userMap
//!     sql: select ${include:columns} from users where id = #{id}
//! ```

use serde::Deserialize;
use sqlmap_core::registry::StatementKind;

// ── Document ────────────────────────────────────────────────────────

/// One mapping document: a namespace and the definitions declared in it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MapperDocument {
    pub namespace: String,
    #[serde(default)]
    pub cache: Option<CacheDef>,
    /// Reusable SQL fragments, referenced with `${include:<id>}`.
    #[serde(default)]
    pub sql: Vec<FragmentDef>,
    #[serde(default)]
    pub parameter_maps: Vec<ParameterMapDef>,
    #[serde(default)]
    pub result_maps: Vec<ResultMapDef>,
    #[serde(default)]
    pub statements: Vec<StatementDef>,
}

// ── Definitions ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CacheDef {
    #[serde(default = "default_eviction")]
    pub eviction: String,
    #[serde(default)]
    pub flush_interval: Option<u64>,
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub read_only: bool,
}

fn default_eviction() -> String {
    "LRU".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FragmentDef {
    pub id: String,
    pub sql: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterMapDef {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultMapDef {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub mappings: Vec<ResultMappingDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultMappingDef {
    pub property: String,
    pub column: String,
    #[serde(default)]
    pub id: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StatementDef {
    pub id: String,
    pub kind: StatementKind,
    pub sql: String,
    #[serde(default)]
    pub parameter_type: Option<String>,
    #[serde(default)]
    pub result_type: Option<String>,
    #[serde(default)]
    pub result_map: Option<String>,
    #[serde(default)]
    pub parameter_map: Option<String>,
    /// Defaults to true for selects, false otherwise.
    #[serde(default)]
    pub use_cache: Option<bool>,
    #[serde(default)]
    pub select_key: Option<SelectKeyDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SelectKeyDef {
    pub key_property: String,
    pub sql: String,
    #[serde(default)]
    pub before: bool,
}
