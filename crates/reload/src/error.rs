//! Error types for resolving, parsing and reloading mapping documents.

use crate::parser::ErrorContext;

/// Resource enumeration failed for a location pattern.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The pattern is not a valid glob.
    #[error("invalid location pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Filesystem I/O error while walking or inspecting resources.
    #[error("IO error resolving '{pattern}': {source}")]
    Io {
        pattern: String,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    pub fn pattern(&self) -> &str {
        match self {
            ResolveError::Pattern { pattern, .. } | ResolveError::Io { pattern, .. } => pattern,
        }
    }
}

/// A single mapping document could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Reading the byte stream failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML syntax or shape error.
    #[error("YAML parse error ({context}): {source}")]
    Yaml {
        context: ErrorContext,
        #[source]
        source: serde_yaml::Error,
    },

    /// Well-formed YAML that does not describe a valid mapping document.
    #[error("invalid mapping document ({context}): {message}")]
    Invalid {
        context: ErrorContext,
        message: String,
    },
}

impl ParseError {
    pub fn invalid(context: &ErrorContext, message: impl Into<String>) -> Self {
        ParseError::Invalid {
            context: context.clone(),
            message: message.into(),
        }
    }
}

/// A reload batch was aborted at the named resource.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("Failed to open mapping resource: '{resource}'")]
    Open {
        resource: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse mapping resource: '{resource}'")]
    Parse {
        resource: String,
        #[source]
        source: ParseError,
    },

    /// A newer generation was published while this one was being built.
    #[error("registry generation {generation} superseded by generation {current}")]
    Superseded { generation: u64, current: u64 },
}

impl ReloadError {
    /// Identifier of the resource that aborted the batch, if one did.
    pub fn resource(&self) -> Option<&str> {
        match self {
            ReloadError::Open { resource, .. } | ReloadError::Parse { resource, .. } => {
                Some(resource)
            }
            ReloadError::Superseded { .. } => None,
        }
    }
}

/// Anything that can fail during one scan-then-reload tick.
#[derive(Debug, thiserror::Error)]
pub enum ReloadServiceError {
    #[error("mapping resource scan failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Reload(#[from] ReloadError),
}
