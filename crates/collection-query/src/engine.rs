//! The search engine facade.
//!
//! [`SearchEngine::search`] runs the whole pipeline for one request:
//!
//! 1. validate and normalize the request
//! 2. resolve a list source for every requested type
//! 3. compile filter patterns (before any fetch)
//! 4. plan server-side filter parameters per type
//! 5. fetch every type concurrently and merge in requested order
//! 6. apply client-side filters
//! 7. apply offset and limit
//! 8. shape the output
//! 9. derive the message and hints
//!
//! Nothing is cached between calls; every search observes what the sources
//! return at call time.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};

use crate::config::EngineConfig;
use crate::error::{SearchError, SearchResult, ValidationError};
use crate::fetch::{FetchLimits, PageFetcher, plan_server_side};
use crate::filter::{FilterSet, filter};
use crate::messages::{self, Counts};
use crate::orchestrator::fetch_all_types;
use crate::pattern::PatternLimits;
use crate::registry::CollectionRegistry;
use crate::shaping::shape;
use crate::types::{SearchRequest, SearchResponse, join_types};
use crate::validation::validate;

/// Multi-collection search engine.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    registry: Arc<CollectionRegistry>,
    config: EngineConfig,
}

impl SearchEngine {
    /// Creates an engine over a registry.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the configuration is invalid.
    pub fn new(registry: CollectionRegistry, config: EngineConfig) -> SearchResult<Self> {
        config
            .validate()
            .map_err(|errors| SearchError::Config { errors })?;

        Ok(Self {
            registry: Arc::new(registry),
            config,
        })
    }

    /// Returns the registry.
    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs a search.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Validation`] if the request is invalid, including
    ///   overly complex patterns; no source is called in that case
    /// - [`SearchError::SourceNotConfigured`] if a requested type has no source
    /// - [`SearchError::Fetch`] if any type's fetch loop fails
    #[instrument(skip_all)]
    pub async fn search(&self, request: SearchRequest) -> SearchResult<SearchResponse> {
        let request = validate(&request, &self.registry, self.config.default_limit)?;

        let sources = request
            .types
            .iter()
            .map(|t| {
                self.registry
                    .source(*t)
                    .map(|source| (*t, source))
                    .ok_or(SearchError::SourceNotConfigured { collection_type: *t })
            })
            .collect::<SearchResult<Vec<_>>>()?;

        let filters = FilterSet::compile(&request, &PatternLimits::from_config(&self.config))?;

        let limits = FetchLimits::from_config(&self.config);
        let mut server_applied = BTreeSet::new();
        let fetchers = sources
            .into_iter()
            .map(|(collection_type, source)| {
                let plan = plan_server_side(self.registry.mapping(collection_type), &request);
                if !request.is_multi_type() {
                    server_applied = plan.applied;
                }
                PageFetcher::new(collection_type, source, limits, plan.params)
            })
            .collect();

        let aggregated = fetch_all_types(fetchers).await?;
        let fetched = aggregated.total_records;

        let matched = filter(aggregated.records, &request, &filters, &server_applied);
        let total_matched = matched.len();

        let window: Vec<Value> = matched
            .into_iter()
            .skip(request.offset as usize)
            .take(request.limit as usize)
            .collect();
        let returned = window.len();
        let has_more =
            aggregated.has_more || (request.offset as usize + returned) < total_matched;

        let data = shape(window, &request, &self.registry);

        let mut warnings = request.warnings.clone();
        warnings.extend_from_slice(filters.warnings());
        warnings.extend(aggregated.warnings);

        let counts = Counts {
            matched: total_matched,
            returned,
            has_more,
        };
        let message = messages::message(&request, counts);
        let hints = messages::hints(&request, counts, &warnings);

        info!(
            types = %join_types(&request.types),
            fetched,
            matched = total_matched,
            returned,
            has_more,
            "Search completed"
        );

        Ok(SearchResponse {
            data,
            total_records: total_matched,
            returned_records: returned,
            has_more,
            offset: request.offset,
            limit: request.limit,
            warnings,
            hints,
            message,
        })
    }

    /// Runs a search given as its JSON wire shape.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidParameter`] if the JSON does not have
    /// the request shape, otherwise the same errors as [`search`](Self::search).
    pub async fn search_json(&self, request: Value) -> SearchResult<SearchResponse> {
        let request: SearchRequest =
            serde_json::from_value(request).map_err(|e| ValidationError::InvalidParameter {
                field: "request".to_string(),
                message: e.to_string(),
            })?;
        self.search(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CollectionType;

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            max_pages: 0,
            ..Default::default()
        };
        let err = SearchEngine::new(CollectionRegistry::new(), config).unwrap_err();
        assert!(matches!(err, SearchError::Config { .. }));
    }

    #[tokio::test]
    async fn test_missing_source() {
        let engine =
            SearchEngine::new(CollectionRegistry::new(), EngineConfig::for_testing()).unwrap();
        let err = engine.search(SearchRequest::new("notes")).await.unwrap_err();
        assert_eq!(err.collection_type(), Some(CollectionType::Notes));
    }

    #[tokio::test]
    async fn test_validation_before_source_lookup() {
        let engine =
            SearchEngine::new(CollectionRegistry::new(), EngineConfig::for_testing()).unwrap();
        let err = engine.search(SearchRequest::new("bugs")).await.unwrap_err();
        assert_eq!(err.field(), Some("types"));
    }

    #[tokio::test]
    async fn test_search_json_rejects_bad_shape() {
        let engine =
            SearchEngine::new(CollectionRegistry::new(), EngineConfig::for_testing()).unwrap();
        let err = engine
            .search_json(serde_json::json!({"types": 42}))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("request"));
    }
}
