//! # collection-query - Multi-Collection Search Engine
//!
//! This crate searches across one or more remote record collections, each
//! reachable only through a paginated "list" operation, and returns one
//! unified, filtered and shaped view of the results.
//!
//! ## Features
//!
//! - **Multi-Type Search**: One request spans any number of collection types,
//!   fetched concurrently and merged in requested order
//! - **Transparent Pagination**: Cursor, offset and bare-list page shapes are
//!   walked to exhaustion or a page ceiling
//! - **Field Filters**: Nine match operators over dot-path fields, with exact,
//!   wildcard and regex pattern modes
//! - **Server-Side Pushdown**: Literal equality filters go to sources that can
//!   apply them themselves
//! - **Output Shaping**: Identifiers only, curated summaries, full records or
//!   an explicit field projection
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use collection_query::{
//!     CollectionRegistry, CollectionType, EngineConfig, SearchEngine, SearchRequest,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = CollectionRegistry::new()
//!         .with_source(CollectionType::Features, Arc::new(FeaturesApi::new()))
//!         .with_source(CollectionType::Products, Arc::new(ProductsApi::new()));
//!
//!     let engine = SearchEngine::new(registry, EngineConfig::from_env())?;
//!
//!     let response = engine
//!         .search(
//!             SearchRequest::for_types(["products", "features"])
//!                 .with_filter("name", "Dark*")
//!                 .with_output_fields(["id", "name"])
//!                 .with_limit(10),
//!         )
//!         .await?;
//!
//!     println!("{}", response.message);
//!     Ok(())
//! }
//! ```
//!
//! ## Match Operators
//!
//! | Operator | Matches when |
//! |----------|--------------|
//! | `equals` | the pattern covers the whole value (default) |
//! | `contains` | the pattern matches anywhere in the value |
//! | `startsWith` / `endsWith` | the pattern matches at the start / end |
//! | `isEmpty` | the field is missing, null or empty (value ignored) |
//! | `before` / `after` | the value is a date before / after the filter date |
//! | `regex` | the value matches the regular expression |
//! | `wildcard` | the value matches the wildcard pattern |
//!
//! ## Modules
//!
//! - [`types`] - Request, page and response types
//! - [`registry`] - Field mappings and list sources
//! - [`validation`] - Request normalization
//! - [`fetch`] / [`orchestrator`] - Pagination and multi-type fan-out
//! - [`pattern`] / [`filter`] - Pattern compilation and client-side filtering
//! - [`shaping`] - Output projection
//! - [`engine`] - The [`SearchEngine`] facade

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod messages;
pub mod orchestrator;
pub mod path;
pub mod pattern;
pub mod registry;
pub mod shaping;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::SearchEngine;
pub use error::{SearchError, SearchResult, SourceError, ValidationError};
pub use registry::{CollectionRegistry, DynListSource, FieldMapping, PagedListSource};
pub use types::{
    CollectionType, ORIGIN_TYPE_FIELD, PageRequest, PageToken, SearchRequest, SearchResponse,
    SearchWarning, WarningCode,
};

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG` takes
/// precedence over `level`.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("collection_query={}", level)));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
