//! Multi-type fetch orchestration.
//!
//! One [`PageFetcher`] per requested type runs as its own task on a
//! [`JoinSet`]. Loops share nothing; results are reassembled in requested-type
//! order once every loop has finished.
//!
//! The first failing loop fails the whole search. Its siblings are aborted
//! and their records discarded. Dropping the returned future drops the
//! `JoinSet`, which aborts every loop still in flight.

use std::collections::HashMap;

use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::error::{SearchError, SearchResult};
use crate::fetch::PageFetcher;
use crate::types::{AggregatedResult, CollectionType, ORIGIN_TYPE_FIELD, PerTypeResult, join_types};

/// Runs every fetcher concurrently and merges their results.
///
/// Records keep upstream order within a type and requested order across
/// types; each record object gains the origin-type marker.
///
/// # Errors
///
/// Returns [`SearchError::Fetch`] naming the first type whose loop failed, or
/// [`SearchError::TaskFailed`] if a loop panicked.
#[instrument(skip_all, fields(loops = fetchers.len()))]
pub async fn fetch_all_types(fetchers: Vec<PageFetcher>) -> SearchResult<AggregatedResult> {
    let order: Vec<CollectionType> = fetchers.iter().map(PageFetcher::collection_type).collect();
    debug!(types = %join_types(&order), "Starting fetch loops");
    let mut slots: Vec<Option<PerTypeResult>> = vec![None; order.len()];
    let mut task_types = HashMap::new();

    let mut tasks = JoinSet::new();
    for (index, fetcher) in fetchers.into_iter().enumerate() {
        let collection_type = fetcher.collection_type();
        let handle = tasks.spawn(async move { (index, fetcher.fetch_all().await) });
        task_types.insert(handle.id(), collection_type);
    }

    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((_, (index, Ok(result)))) => {
                debug!(
                    collection_type = %order[index],
                    records = result.total_records,
                    has_more = result.has_more,
                    "Fetch loop completed"
                );
                slots[index] = Some(result);
            }
            Ok((_, (index, Err(source)))) => {
                let collection_type = order[index];
                warn!(%collection_type, error = %source, "Fetch loop failed, abandoning search");
                tasks.abort_all();
                return Err(SearchError::Fetch {
                    collection_type,
                    source,
                });
            }
            Err(err) => {
                let collection_type = task_types
                    .get(&err.id())
                    .copied()
                    .unwrap_or(order[0]);
                warn!(%collection_type, error = %err, "Fetch task did not complete");
                tasks.abort_all();
                return Err(SearchError::TaskFailed {
                    collection_type,
                    message: err.to_string(),
                });
            }
        }
    }

    let mut aggregated = AggregatedResult::default();
    for (collection_type, slot) in order.into_iter().zip(slots) {
        let Some(result) = slot else {
            return Err(SearchError::TaskFailed {
                collection_type,
                message: "fetch loop produced no result".to_string(),
            });
        };
        merge(&mut aggregated, collection_type, result);
    }

    Ok(aggregated)
}

/// Appends one type's result to the aggregate.
pub fn merge(aggregated: &mut AggregatedResult, collection_type: CollectionType, result: PerTypeResult) {
    aggregated.total_records += result.total_records;
    aggregated.has_more |= result.has_more;
    aggregated.warnings.extend(result.warnings);
    aggregated.records.extend(
        result
            .records
            .into_iter()
            .map(|record| tag(record, collection_type)),
    );
}

/// Marks a record with the type it came from.
fn tag(mut record: Value, collection_type: CollectionType) -> Value {
    if let Value::Object(obj) = &mut record {
        obj.insert(
            ORIGIN_TYPE_FIELD.to_string(),
            Value::String(collection_type.as_str().to_string()),
        );
    }
    record
}
