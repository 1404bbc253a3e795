//! Common test utilities for search engine testing.
//!
//! - [`source`] - Scripted in-memory list sources
//! - [`fixtures`] - Record fixtures

#![allow(dead_code)]

pub mod fixtures;
pub mod source;

use std::sync::Arc;

use collection_query::{CollectionRegistry, CollectionType, EngineConfig, SearchEngine};

pub use fixtures::*;
pub use source::{Paging, ScriptedSource};

/// Builds an engine with the testing configuration and the given sources.
pub fn engine_with(sources: Vec<(CollectionType, Arc<ScriptedSource>)>) -> SearchEngine {
    engine_with_config(sources, EngineConfig::for_testing())
}

/// Builds an engine with a custom configuration.
pub fn engine_with_config(
    sources: Vec<(CollectionType, Arc<ScriptedSource>)>,
    config: EngineConfig,
) -> SearchEngine {
    let registry = sources
        .into_iter()
        .fold(CollectionRegistry::new(), |registry, (t, source)| {
            registry.with_source(t, source)
        });
    SearchEngine::new(registry, config).expect("testing config is valid")
}
