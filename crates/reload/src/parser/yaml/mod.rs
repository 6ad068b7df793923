//! Reference [`MappingParser`] for YAML mapping documents.

mod document;

use std::io::Read;
use std::sync::Arc;

use sqlmap_core::registry::{
    CacheEntry, KeyGenerator, MappedStatement, ParameterMap, ResultMap, ResultMapping,
    SqlFragment, StatementKind,
};
use sqlmap_core::Generation;
use tracing::debug;

use crate::error::ParseError;

use super::{ErrorContext, MappingParser};

pub use self::document::{
    CacheDef, FragmentDef, MapperDocument, ParameterMapDef, ResultMapDef, ResultMappingDef,
    SelectKeyDef, StatementDef,
};

const INCLUDE_OPEN: &str = "${include:";
const SELECT_KEY_SUFFIX: &str = "!selectKey";

/// Parses [`MapperDocument`]s into registry entries.
///
/// Definition ids are qualified with the document namespace; references
/// (result maps, parameter maps, includes) without a `.` are qualified the
/// same way. Fragments are registered before statements, in document order,
/// and `${include:<id>}` is expanded against the generation's fragment
/// collection, so a fragment from another document must have been parsed
/// earlier in the same generation.
#[derive(Debug, Clone, Default)]
pub struct YamlMappingParser;

impl YamlMappingParser {
    pub fn new() -> Self {
        Self
    }

    /// Deserialize a document without registering anything.
    pub fn read_document(
        &self,
        reader: &mut dyn Read,
        context: &mut ErrorContext,
    ) -> Result<MapperDocument, ParseError> {
        context.activity("reading mapping document");
        let mut text = String::new();
        reader.read_to_string(&mut text)?;

        context.activity("parsing YAML");
        serde_yaml::from_str(&text).map_err(|source| ParseError::Yaml {
            context: context.clone(),
            source,
        })
    }
}

impl MappingParser for YamlMappingParser {
    fn parse(
        &self,
        reader: &mut dyn Read,
        generation: &mut Generation,
        resource_id: &str,
        context: &mut ErrorContext,
    ) -> Result<(), ParseError> {
        if generation.is_resource_loaded(resource_id) {
            debug!(resource = %resource_id, "mapping resource already loaded, skipping");
            return Ok(());
        }

        let document = self.read_document(reader, context)?;
        let namespace = document.namespace.trim();
        if namespace.is_empty() {
            return Err(ParseError::invalid(context, "mapper namespace cannot be empty"));
        }
        let ns = Namespace(namespace);

        if let Some(cache) = &document.cache {
            context.activity("building cache").object(namespace);
            generation.caches.insert(
                namespace,
                Arc::new(CacheEntry {
                    id: namespace.to_string(),
                    eviction: cache.eviction.clone(),
                    flush_interval_ms: cache.flush_interval,
                    size: cache.size,
                    read_only: cache.read_only,
                    resource: resource_id.to_string(),
                }),
            );
        }

        for def in &document.sql {
            context.activity("registering SQL fragment").object(&def.id);
            let id = ns.definition(&def.id, context)?;
            let sql = expand_includes(&def.sql, &ns, generation, context)?;
            generation.fragments.insert(
                id.clone(),
                Arc::new(SqlFragment {
                    id,
                    sql,
                    resource: resource_id.to_string(),
                }),
            );
        }

        for def in &document.parameter_maps {
            context.activity("building parameter map").object(&def.id);
            let id = ns.definition(&def.id, context)?;
            generation.parameter_maps.insert(
                id.clone(),
                Arc::new(ParameterMap {
                    id,
                    type_name: def.type_name.clone(),
                    parameters: def.parameters.clone(),
                    resource: resource_id.to_string(),
                }),
            );
        }

        for def in &document.result_maps {
            context.activity("building result map").object(&def.id);
            let id = ns.definition(&def.id, context)?;
            let mappings = def
                .mappings
                .iter()
                .map(|m| ResultMapping {
                    property: m.property.clone(),
                    column: m.column.clone(),
                    id: m.id,
                })
                .collect();
            generation.result_maps.insert(
                id.clone(),
                Arc::new(ResultMap {
                    id,
                    type_name: def.type_name.clone(),
                    mappings,
                    resource: resource_id.to_string(),
                }),
            );
        }

        for def in &document.statements {
            context.activity("building statement").object(&def.id);
            let id = ns.definition(&def.id, context)?;
            let sql = expand_includes(&def.sql, &ns, generation, context)?;

            let key_generator = match &def.select_key {
                Some(select_key) => {
                    if def.kind != StatementKind::Insert && def.kind != StatementKind::Update {
                        return Err(ParseError::invalid(
                            context,
                            "selectKey is only allowed on insert and update statements",
                        ));
                    }
                    let key_id = format!("{}{}", id, SELECT_KEY_SUFFIX);
                    let key_sql = expand_includes(&select_key.sql, &ns, generation, context)?;
                    generation.key_generators.insert(
                        key_id.clone(),
                        Arc::new(KeyGenerator {
                            id: key_id.clone(),
                            key_property: select_key.key_property.clone(),
                            sql: key_sql,
                            before: select_key.before,
                            resource: resource_id.to_string(),
                        }),
                    );
                    Some(key_id)
                }
                None => None,
            };

            generation.statements.insert(
                id.clone(),
                Arc::new(MappedStatement {
                    id,
                    kind: def.kind,
                    sql,
                    parameter_type: def.parameter_type.clone(),
                    result_type: def.result_type.clone(),
                    result_map: def.result_map.as_deref().map(|r| ns.reference(r)),
                    parameter_map: def.parameter_map.as_deref().map(|r| ns.reference(r)),
                    key_generator,
                    use_cache: def.use_cache.unwrap_or(def.kind == StatementKind::Select),
                    resource: resource_id.to_string(),
                }),
            );
        }

        generation.add_loaded_resource(resource_id);
        debug!(
            resource = %resource_id,
            namespace = %namespace,
            statements = document.statements.len(),
            "mapping document parsed"
        );
        Ok(())
    }
}

/// The namespace of the document being parsed.
struct Namespace<'a>(&'a str);

impl Namespace<'_> {
    /// Qualify a definition id; dotted ids must already carry this namespace.
    fn definition(&self, id: &str, context: &ErrorContext) -> Result<String, ParseError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ParseError::invalid(context, "element id cannot be empty"));
        }
        if let Some(rest) = id.strip_prefix(self.0).and_then(|r| r.strip_prefix('.')) {
            if !rest.contains('.') {
                return Ok(id.to_string());
            }
        }
        if id.contains('.') {
            return Err(ParseError::invalid(
                context,
                format!("dots are not allowed in element names, please remove it from '{}'", id),
            ));
        }
        Ok(format!("{}.{}", self.0, id))
    }

    /// Qualify a reference; dotted references are taken as already qualified.
    fn reference(&self, name: &str) -> String {
        let name = name.trim();
        if name.contains('.') {
            name.to_string()
        } else {
            format!("{}.{}", self.0, name)
        }
    }
}

/// Replace every `${include:<ref>}` with the referenced fragment's SQL.
fn expand_includes(
    sql: &str,
    ns: &Namespace<'_>,
    generation: &Generation,
    context: &ErrorContext,
) -> Result<String, ParseError> {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;

    while let Some(start) = rest.find(INCLUDE_OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + INCLUDE_OPEN.len()..];
        let Some(end) = after.find('}') else {
            return Err(ParseError::invalid(context, "unterminated ${include:...} reference"));
        };

        let refid = ns.reference(&after[..end]);
        let fragment = generation.fragment(&refid).map_err(|e| {
            ParseError::invalid(context, format!("could not include SQL fragment: {}", e))
        })?;
        out.push_str(fragment.sql.trim());
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
