//! Per-type pagination fetcher.
//!
//! [`PageFetcher`] walks one collection's paged list operation page by page.
//! Each page's position depends on the previous answer, so pages are fetched
//! strictly in sequence. The loop ends when:
//!
//! - a page carries no next indicator (done)
//! - the page ceiling is reached (`has_more = true`)
//! - the source hands back a cursor it already returned (`has_more = true`)
//! - the source fails (error, no partial result)

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, instrument, warn};

use crate::config::EngineConfig;
use crate::error::SourceError;
use crate::pattern::has_wildcards;
use crate::registry::{DynListSource, FieldMapping};
use crate::types::{
    CollectionType, FieldFilter, FilterOperator, NormalizedPage, NormalizedSearchRequest,
    PageRequest, PatternMode, PerTypeResult, SearchWarning, WarningCode,
};

/// Paging limits for one fetch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    /// Records requested per page.
    pub page_size: u32,

    /// Most pages fetched before stopping.
    pub max_pages: u32,
}

impl FetchLimits {
    /// Reads the limits from the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_pages: config.max_pages,
        }
    }
}

/// Filters a list source applies itself, for one collection type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerSidePlan {
    /// Upstream query parameters.
    pub params: BTreeMap<String, String>,

    /// Filter fields covered by `params`.
    pub applied: BTreeSet<String>,
}

/// Selects the filters a collection's list source can apply itself.
///
/// Only case-sensitive literal equality filters on server-side fields are
/// sent upstream. Sources compare exactly; every other filter is evaluated
/// client-side.
pub fn plan_server_side(
    mapping: &FieldMapping,
    request: &NormalizedSearchRequest,
) -> ServerSidePlan {
    let mut plan = ServerSidePlan::default();

    for filter in &request.filters {
        let Some(param) = mapping.server_param(&filter.field) else {
            continue;
        };
        let Some(value) = literal_equality(filter, request.pattern_mode, request.case_sensitive)
        else {
            continue;
        };
        plan.params.insert(param.to_string(), value.to_string());
        plan.applied.insert(filter.field.clone());
    }

    plan
}

fn literal_equality(filter: &FieldFilter, mode: PatternMode, case_sensitive: bool) -> Option<&str> {
    if !case_sensitive || filter.effective_operator() != FilterOperator::Equals {
        return None;
    }
    let value = filter.value.as_text()?;
    match mode {
        PatternMode::Exact => Some(value),
        PatternMode::Wildcard if !has_wildcards(value) => Some(value),
        _ => None,
    }
}

/// Walks one collection type's list source.
pub struct PageFetcher {
    collection_type: CollectionType,
    source: DynListSource,
    limits: FetchLimits,
    params: BTreeMap<String, String>,
}

impl PageFetcher {
    /// Creates a fetcher sending `params` with every page request.
    pub fn new(
        collection_type: CollectionType,
        source: DynListSource,
        limits: FetchLimits,
        params: BTreeMap<String, String>,
    ) -> Self {
        Self {
            collection_type,
            source,
            limits,
            params,
        }
    }

    /// Returns the collection type being fetched.
    pub fn collection_type(&self) -> CollectionType {
        self.collection_type
    }

    /// Fetches every page, up to the page ceiling.
    ///
    /// # Errors
    ///
    /// Returns the first [`SourceError`] raised by the source or by page
    /// normalization. Records gathered before the failure are discarded.
    #[instrument(skip(self), fields(collection_type = %self.collection_type))]
    pub async fn fetch_all(&self) -> Result<PerTypeResult, SourceError> {
        let mut result = PerTypeResult::default();
        let mut request = PageRequest::first(self.limits.page_size, self.params.clone());
        let mut seen = HashSet::new();

        loop {
            let raw = self.source.list_page(request.clone()).await.inspect_err(|e| {
                warn!(page = result.pages_fetched + 1, error = %e, "Page fetch failed");
            })?;
            result.pages_fetched += 1;

            let page = NormalizedPage::from_value(raw, &request)?;
            debug!(
                page = result.pages_fetched,
                records = page.records.len(),
                has_next = !page.is_terminal(),
                "Fetched page"
            );
            result.records.extend(page.records);

            let Some(token) = page.next else {
                break;
            };

            if result.pages_fetched >= self.limits.max_pages {
                warn!(
                    max_pages = self.limits.max_pages,
                    records = result.records.len(),
                    "Page ceiling reached, more records remain"
                );
                result.has_more = true;
                result.warnings.push(SearchWarning::general(
                    WarningCode::PageLimitReached,
                    format!(
                        "stopped fetching {} after {} pages; more records exist upstream",
                        self.collection_type, self.limits.max_pages
                    ),
                ));
                break;
            }

            if !seen.insert(token.clone()) {
                warn!(token = ?token, "Source repeated a page cursor");
                result.has_more = true;
                result.warnings.push(SearchWarning::general(
                    WarningCode::RepeatedCursor,
                    format!(
                        "{} returned the same next-page cursor twice; stopped after {} pages",
                        self.collection_type, result.pages_fetched
                    ),
                ));
                break;
            }

            request = request.at(token);
        }

        result.total_records = result.records.len();
        debug!(
            pages = result.pages_fetched,
            records = result.total_records,
            has_more = result.has_more,
            "Fetch loop finished"
        );
        Ok(result)
    }
}
