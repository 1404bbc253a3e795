//! Core types for search requests, pages and responses.
//!
//! - [`collection`] - The closed set of searchable collection types
//! - [`request`] - Raw caller-facing request shape
//! - [`normalized`] - Validated request, filters and operators
//! - [`page`] - Page requests, tokens and page-shape normalization
//! - [`response`] - Per-type results, aggregated results and the response

pub mod collection;
pub mod normalized;
pub mod page;
pub mod request;
pub mod response;

pub use collection::CollectionType;
pub(crate) use collection::join_types;
pub use normalized::{
    DetailLevel, FieldFilter, FilterOperator, FilterValue, NormalizedSearchRequest, OutputMode,
    PatternMode,
};
pub use page::{NormalizedPage, PageRequest, PageToken};
pub use request::{OneOrMany, OutputSpec, SearchRequest};
pub use response::{
    AggregatedResult, PerTypeResult, SearchResponse, SearchWarning, WarningCode,
};

/// Reserved record key carrying the origin collection type.
pub const ORIGIN_TYPE_FIELD: &str = "_collectionType";

/// Record key holding the identifier.
pub const ID_FIELD: &str = "id";
