//! Mapping-document parsing seam.
//!
//! The reloader depends only on [`MappingParser`]. [`YamlMappingParser`] is a
//! reference implementation reading a declarative YAML mapping format.

mod context;
mod yaml;


use std::io::Read;

use sqlmap_core::Generation;

use crate::error::ParseError;

pub use self::context::{ErrorContext, ErrorContextScope};
pub use self::yaml::{
    CacheDef, FragmentDef, MapperDocument, ParameterMapDef, ResultMapDef, ResultMappingDef,
    SelectKeyDef, StatementDef, YamlMappingParser,
};

/// Parses one mapping document into a generation under construction.
///
/// Shared SQL fragments are read from and written to `generation.fragments`.
/// Implementations record their progress in `context` so failures can say
/// where they happened; the caller resets it when the parse ends.
pub trait MappingParser: Send + Sync {
    fn parse(
        &self,
        reader: &mut dyn Read,
        generation: &mut Generation,
        resource_id: &str,
        context: &mut ErrorContext,
    ) -> Result<(), ParseError>;
}
