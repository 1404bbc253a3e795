//! Output shaping.
//!
//! Projects filtered records into the requested [`OutputMode`]:
//! - `ids-only` - Bare identifiers, one per record
//! - `summary` - The type's curated fields, widened or narrowed by [`DetailLevel`]
//! - `full` - Records as fetched, optionally without nested sub-data
//! - field list - Exactly the requested dot-paths, in a matching nested shape
//!
//! The origin-type marker survives every mode except `ids-only`.

use serde_json::Value;

use crate::path;
use crate::registry::{CollectionRegistry, TIMESTAMP_FIELDS};
use crate::types::{
    CollectionType, DetailLevel, ID_FIELD, NormalizedSearchRequest, ORIGIN_TYPE_FIELD, OutputMode,
};

/// Shapes every record according to the request's output mode.
///
/// The result has exactly one element per input record.
pub fn shape(
    records: Vec<Value>,
    request: &NormalizedSearchRequest,
    registry: &CollectionRegistry,
) -> Vec<Value> {
    match &request.output {
        OutputMode::IdsOnly => records.iter().map(identifier).collect(),
        OutputMode::Summary => records
            .iter()
            .map(|record| {
                let collection_type = record_type(record, request);
                let fields = summary_fields(registry, collection_type, request.detail);
                path::project(record, &fields)
            })
            .collect(),
        OutputMode::Full if request.include_sub_data => records,
        OutputMode::Full => records
            .iter()
            .map(|record| {
                let collection_type = record_type(record, request);
                path::strip(record, &registry.mapping(collection_type).sub_data_fields)
            })
            .collect(),
        OutputMode::Fields(fields) => {
            let mut paths: Vec<&str> = fields.iter().map(String::as_str).collect();
            if !paths.contains(&ORIGIN_TYPE_FIELD) {
                paths.push(ORIGIN_TYPE_FIELD);
            }
            records
                .iter()
                .map(|record| path::project(record, &paths))
                .collect()
        }
    }
}

/// Returns the summary projection for a type at a detail level.
pub fn summary_fields(
    registry: &CollectionRegistry,
    collection_type: CollectionType,
    detail: DetailLevel,
) -> Vec<&'static str> {
    let curated = &registry.mapping(collection_type).summary_fields;
    let mut fields: Vec<&'static str> = match detail {
        DetailLevel::Basic => curated.iter().take(2).copied().collect(),
        DetailLevel::Standard => curated.clone(),
        DetailLevel::Full => curated
            .iter()
            .chain(TIMESTAMP_FIELDS.iter())
            .copied()
            .collect(),
    };
    fields.push(ORIGIN_TYPE_FIELD);
    fields
}

/// Returns a record's identifier, or `null` when it has none.
fn identifier(record: &Value) -> Value {
    record.get(ID_FIELD).cloned().unwrap_or(Value::Null)
}

/// Reads the origin type from the marker, defaulting to the first requested type.
fn record_type(record: &Value, request: &NormalizedSearchRequest) -> CollectionType {
    record
        .get(ORIGIN_TYPE_FIELD)
        .and_then(Value::as_str)
        .and_then(|name| name.parse().ok())
        .unwrap_or(request.types[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchRequest;
    use crate::validation::validate;
    use serde_json::json;

    fn normalize(request: SearchRequest) -> NormalizedSearchRequest {
        validate(&request, &CollectionRegistry::new(), 50).unwrap()
    }

    fn feature() -> Value {
        json!({
            "id": "f1",
            "name": "Dark mode",
            "description": "<p>Long text</p>",
            "type": "feature",
            "status": {"id": "s1", "name": "In progress"},
            "parent": {"component": {"id": "c1"}},
            "links": {"self": "https://example.com/features/f1"},
            "createdAt": "2024-01-01T00:00:00Z",
            "_collectionType": "features"
        })
    }

    #[test]
    fn test_ids_only() {
        let request = normalize(SearchRequest::new("features").with_output_mode("ids-only"));
        let shaped = shape(vec![feature(), json!({"name": "no id"})], &request, &CollectionRegistry::new());
        assert_eq!(shaped, vec![json!("f1"), Value::Null]);
    }

    #[test]
    fn test_summary_standard() {
        let request = normalize(SearchRequest::new("features").with_output_mode("summary"));
        let shaped = shape(vec![feature()], &request, &CollectionRegistry::new());
        assert_eq!(
            shaped[0],
            json!({
                "id": "f1",
                "name": "Dark mode",
                "type": "feature",
                "status": {"name": "In progress"},
                "parent": {"component": {"id": "c1"}},
                "_collectionType": "features"
            })
        );
    }

    #[test]
    fn test_summary_detail_levels() {
        let registry = CollectionRegistry::new();

        let request = normalize(
            SearchRequest::new("features")
                .with_output_mode("summary")
                .with_detail("basic"),
        );
        let shaped = shape(vec![feature()], &request, &registry);
        assert_eq!(
            shaped[0],
            json!({"id": "f1", "name": "Dark mode", "_collectionType": "features"})
        );

        let request = normalize(
            SearchRequest::new("features")
                .with_output_mode("summary")
                .with_detail("full"),
        );
        let shaped = shape(vec![feature()], &request, &registry);
        assert_eq!(shaped[0]["createdAt"], "2024-01-01T00:00:00Z");
        assert!(shaped[0].get("updatedAt").is_none());
    }

    #[test]
    fn test_full_passthrough() {
        let request = normalize(SearchRequest::new("features"));
        let shaped = shape(vec![feature()], &request, &CollectionRegistry::new());
        assert_eq!(shaped[0], feature());
    }

    #[test]
    fn test_full_without_sub_data() {
        let request = normalize(SearchRequest::new("features").with_sub_data(false));
        let shaped = shape(vec![feature()], &request, &CollectionRegistry::new());
        assert!(shaped[0].get("links").is_none());
        assert_eq!(shaped[0]["description"], "<p>Long text</p>");
    }

    #[test]
    fn test_explicit_fields_keep_marker() {
        let request = normalize(
            SearchRequest::new("features").with_output_fields(["id", "status.name", "owner.email"]),
        );
        let shaped = shape(vec![feature()], &request, &CollectionRegistry::new());
        assert_eq!(
            shaped[0],
            json!({
                "id": "f1",
                "status": {"name": "In progress"},
                "_collectionType": "features"
            })
        );
    }

    #[test]
    fn test_summary_uses_each_records_type() {
        let request = normalize(
            SearchRequest::for_types(["features", "notes"]).with_output_mode("summary"),
        );
        let note = json!({
            "id": "n1",
            "title": "Login broken",
            "content": "details",
            "_collectionType": "notes"
        });
        let shaped = shape(vec![feature(), note], &request, &CollectionRegistry::new());
        assert_eq!(
            shaped[1],
            json!({"id": "n1", "title": "Login broken", "_collectionType": "notes"})
        );
        assert_eq!(shaped[0]["name"], "Dark mode");
    }
}
