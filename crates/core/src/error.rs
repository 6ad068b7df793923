use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("{0} must be greater than zero")]
    Zero(String),
}

/// Failure to resolve a name against one of the registry collections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("{collection} collection does not contain value for {name}")]
    NotFound {
        collection: &'static str,
        name: String,
    },

    #[error(
        "{name} is ambiguous in {collection} collection \
         (try using the full name including the namespace, or rename one of the entries)"
    )]
    Ambiguous {
        collection: &'static str,
        name: String,
    },
}

impl LookupError {
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, LookupError::Ambiguous { .. })
    }
}
