//! Live SQL mapping registry.
//!
//! The registry is published as a sequence of immutable [`Generation`]s:
//! each reload builds a complete generation off to the side and swaps it in
//! atomically, so concurrent readers observe either the old or the new
//! generation, never a mix of both.

pub mod entry;
mod generation;
mod live;
mod strict_map;


pub use self::entry::{
    CacheEntry, KeyGenerator, MappedStatement, MappingEntry, ParameterMap, ResultMap,
    ResultMapping, SqlFragment, StatementKind,
};
pub use self::generation::{Generation, GenerationStats};
pub use self::live::LiveRegistry;
pub use self::strict_map::{short_name, Ambiguity, StrictMap};
