//! Error types for the search engine.
//!
//! Errors are split by where they originate: request validation, the external
//! paged-list sources, and the engine itself. [`SearchError`] is the single
//! error type returned by [`SearchEngine::search`](crate::SearchEngine::search).

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::types::CollectionType;

/// The primary error type for search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The request failed validation before any fetch was issued.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A collection's fetch loop failed; the whole search is abandoned.
    #[error("fetch failed for {collection_type}: {source}")]
    Fetch {
        collection_type: CollectionType,
        #[source]
        source: SourceError,
    },

    /// A requested collection type has no registered list source.
    #[error("no list source configured for {collection_type}")]
    SourceNotConfigured { collection_type: CollectionType },

    /// A fetch task panicked or was cancelled before it finished.
    #[error("fetch task for {collection_type} did not complete: {message}")]
    TaskFailed {
        collection_type: CollectionType,
        message: String,
    },

    /// The engine configuration is invalid.
    #[error("invalid configuration: {}", .errors.join("; "))]
    Config { errors: Vec<String> },
}

impl SearchError {
    /// Returns the offending request field for validation failures.
    pub fn field(&self) -> Option<&str> {
        match self {
            SearchError::Validation(err) => Some(err.field()),
            _ => None,
        }
    }

    /// Returns the collection type a fetch-side failure belongs to.
    pub fn collection_type(&self) -> Option<CollectionType> {
        match self {
            SearchError::Fetch {
                collection_type, ..
            }
            | SearchError::SourceNotConfigured { collection_type }
            | SearchError::TaskFailed {
                collection_type, ..
            } => Some(*collection_type),
            _ => None,
        }
    }
}

/// Request validation failures.
///
/// Every variant names the request field that caused it, see [`ValidationError::field`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A requested collection type is not part of the closed set.
    #[error("unknown collection type '{value}'; valid types are: {valid}")]
    UnknownCollectionType { value: String, valid: String },

    /// No collection type was requested.
    #[error("at least one collection type must be requested")]
    EmptyTypes,

    /// The filter field is not searchable in any requested type.
    #[error("field '{field}' is not searchable in {types}")]
    UnsearchableField { field: String, types: String },

    /// The operator is not one of the supported operators.
    #[error("unknown operator '{operator}' for field '{field}'; supported operators are: {supported}")]
    UnknownOperator {
        field: String,
        operator: String,
        supported: String,
    },

    /// A request parameter has an unsupported value.
    #[error("invalid value for '{field}': {message}")]
    InvalidParameter { field: String, message: String },

    /// An explicit output field is not available in any requested type.
    #[error("output field '{field}' is not available in {types}")]
    UnavailableOutputField { field: String, types: String },

    /// A filter pattern exceeds the complexity limits.
    #[error("pattern for field '{field}' is too complex: {reason}")]
    PatternTooComplex { field: String, reason: String },
}

impl ValidationError {
    /// Returns the name of the request field this error is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::UnknownCollectionType { .. } | ValidationError::EmptyTypes => "types",
            ValidationError::UnsearchableField { field, .. }
            | ValidationError::UnknownOperator { field, .. }
            | ValidationError::InvalidParameter { field, .. }
            | ValidationError::UnavailableOutputField { field, .. }
            | ValidationError::PatternTooComplex { field, .. } => field,
        }
    }
}

/// Errors returned by an external paged-list source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The upstream system could not be reached.
    #[error("source unavailable: {message}")]
    Unavailable { message: String },

    /// The upstream system answered with an error.
    #[error("upstream error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// The returned page does not have a recognizable shape.
    #[error("malformed page: {message}")]
    MalformedPage { message: String },

    /// Any other failure inside the source.
    #[error("internal source error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// Result type alias for validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::MalformedPage {
            message: err.to_string(),
        }
    }
}
