//! Request normalization and validation.
//!
//! [`validate`] turns a raw [`SearchRequest`] into a [`NormalizedSearchRequest`]
//! or fails with a [`ValidationError`] naming the offending field. Rules are
//! applied in a fixed order:
//!
//! 1. `types` is coerced to a list
//! 2. every type must be a known collection type
//! 3. defaults are applied (`output=full`, `limit`, `offset=0`, `detail=standard`)
//! 4. `limit` is clamped into `[1, 100]` and `offset` floored at 0
//! 5. each filter field must be searchable in at least one requested type
//! 6. empty filter values collapse to [`FilterValue::Empty`]
//! 7. each operator must be one of the supported operators
//! 8. explicit output fields must be available in at least one requested type
//!
//! Conditions that change nothing about the result set but deserve the
//! caller's attention are returned as warnings on the normalized request.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::debug;

use crate::error::{ValidationError, ValidationResult};
use crate::registry::CollectionRegistry;
use crate::types::{
    CollectionType, DetailLevel, FieldFilter, FilterOperator, FilterValue,
    NormalizedSearchRequest, ORIGIN_TYPE_FIELD, OutputMode, OutputSpec, PatternMode,
    SearchRequest, SearchWarning, WarningCode, join_types,
};

/// Smallest accepted limit.
pub const MIN_LIMIT: u32 = 1;

/// Largest accepted limit.
pub const MAX_LIMIT: u32 = 100;

/// Validates and normalizes a search request.
///
/// `default_limit` is used when the request carries no limit.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered, in rule order.
pub fn validate(
    request: &SearchRequest,
    registry: &CollectionRegistry,
    default_limit: u32,
) -> ValidationResult<NormalizedSearchRequest> {
    let types = parse_types(&request.types.clone().into_vec())?;
    let mut warnings = Vec::new();

    let limit = clamp_limit(request.limit.unwrap_or(i64::from(default_limit)));
    let offset = clamp_offset(request.offset.unwrap_or(0));

    let output = match &request.output {
        None => OutputMode::Full,
        Some(OutputSpec::Mode(mode)) => {
            OutputMode::parse_mode(mode).ok_or_else(|| ValidationError::InvalidParameter {
                field: "output".to_string(),
                message: format!(
                    "unknown output mode '{}'; expected ids-only, summary, full or a list of fields",
                    mode
                ),
            })?
        }
        Some(OutputSpec::Fields(fields)) => OutputMode::Fields(fields.clone()),
    };

    let detail = match &request.detail {
        None => DetailLevel::default(),
        Some(detail) => detail.parse().map_err(|message| ValidationError::InvalidParameter {
            field: "detail".to_string(),
            message,
        })?,
    };

    let pattern_mode = match &request.pattern_mode {
        None => PatternMode::default(),
        Some(mode) => mode.parse().map_err(|message| ValidationError::InvalidParameter {
            field: "patternMode".to_string(),
            message,
        })?,
    };

    let filters = normalize_filters(
        &request.filters,
        &request.operators,
        &types,
        registry,
        &mut warnings,
    )?;

    if let OutputMode::Fields(fields) = &output {
        check_output_fields(fields, &types, registry, &mut warnings)?;
    }

    debug!(
        types = %join_types(&types),
        filters = filters.len(),
        output = output.name(),
        limit,
        offset,
        "Validated search request"
    );

    Ok(NormalizedSearchRequest {
        types,
        filters,
        output,
        limit,
        offset,
        detail,
        include_sub_data: request.include_sub_data.unwrap_or(true),
        pattern_mode,
        case_sensitive: request.case_sensitive.unwrap_or(false),
        warnings,
    })
}

/// Clamps a requested limit into `[MIN_LIMIT, MAX_LIMIT]`.
pub fn clamp_limit(limit: i64) -> u32 {
    limit.clamp(i64::from(MIN_LIMIT), i64::from(MAX_LIMIT)) as u32
}

/// Floors a requested offset at 0.
pub fn clamp_offset(offset: i64) -> u32 {
    offset.clamp(0, i64::from(u32::MAX)) as u32
}

/// Parses type names, rejecting unknown ones and dropping duplicates.
fn parse_types(names: &[String]) -> ValidationResult<Vec<CollectionType>> {
    let mut types = Vec::with_capacity(names.len());

    for name in names {
        let parsed: CollectionType =
            name.parse()
                .map_err(|_| ValidationError::UnknownCollectionType {
                    value: name.clone(),
                    valid: CollectionType::valid_names(),
                })?;
        if !types.contains(&parsed) {
            types.push(parsed);
        }
    }

    if types.is_empty() {
        return Err(ValidationError::EmptyTypes);
    }

    Ok(types)
}

fn parse_operator(
    field: &str,
    name: &str,
    warnings: &mut Vec<SearchWarning>,
) -> ValidationResult<FilterOperator> {
    let operator = FilterOperator::parse(name).ok_or_else(|| ValidationError::UnknownOperator {
        field: field.to_string(),
        operator: name.to_string(),
        supported: FilterOperator::supported_names(),
    })?;

    match operator {
        FilterOperator::IsEmpty => warnings.push(SearchWarning::for_field(
            WarningCode::IsEmptyIgnoresValue,
            field,
            format!(
                "'{}' uses isEmpty: matches records where the field is missing, null or empty; the filter value is ignored",
                field
            ),
        )),
        FilterOperator::Regex => warnings.push(SearchWarning::for_field(
            WarningCode::RegexOperator,
            field,
            format!(
                "'{}' is matched as a regular expression regardless of patternMode",
                field
            ),
        )),
        FilterOperator::Wildcard => warnings.push(SearchWarning::for_field(
            WarningCode::WildcardOperator,
            field,
            format!(
                "'{}' is matched as a wildcard pattern ('*' any run, '?' one character) regardless of patternMode",
                field
            ),
        )),
        _ => {}
    }

    Ok(operator)
}

/// Builds the filter list: searchability first, then values, then operators.
fn normalize_filters(
    raw: &BTreeMap<String, Value>,
    raw_operators: &BTreeMap<String, String>,
    types: &[CollectionType],
    registry: &CollectionRegistry,
    warnings: &mut Vec<SearchWarning>,
) -> ValidationResult<Vec<FieldFilter>> {
    let values: BTreeMap<String, &Value> = raw
        .iter()
        .map(|(field, value)| (field.trim().to_string(), value))
        .collect();
    let operator_names: BTreeMap<String, &String> = raw_operators
        .iter()
        .map(|(field, name)| (field.trim().to_string(), name))
        .collect();

    let fields: BTreeSet<&String> = values.keys().chain(operator_names.keys()).collect();

    let mut applicable = BTreeMap::new();
    for field in &fields {
        if field.is_empty() {
            return Err(ValidationError::InvalidParameter {
                field: "filters".to_string(),
                message: "filter field names cannot be empty".to_string(),
            });
        }

        let types_for_field = registry.searchable_in(types, field);
        if types_for_field.is_empty() {
            return Err(ValidationError::UnsearchableField {
                field: field.to_string(),
                types: join_types(types),
            });
        }
        if types_for_field.len() < types.len() {
            warnings.push(SearchWarning::for_field(
                WarningCode::PartialFieldSupport,
                field.as_str(),
                format!(
                    "'{}' is only searchable in: {}",
                    field,
                    join_types(&types_for_field)
                ),
            ));
        }
        applicable.insert(field.to_string(), types_for_field);
    }

    let mut normalized = BTreeMap::new();
    for field in &fields {
        let value = normalize_value(field, values.get(*field).copied())?;
        if value.is_empty() {
            warnings.push(SearchWarning::for_field(
                WarningCode::EmptyValueSearch,
                field.as_str(),
                format!(
                    "empty value requested for '{}': records where it is missing, null or empty will match",
                    field
                ),
            ));
        }
        normalized.insert(field.to_string(), value);
    }

    let mut operators = BTreeMap::new();
    for (field, name) in &operator_names {
        let operator = parse_operator(field, name, warnings)?;
        // isEmpty needs no value; any other operator without one is a mistake
        if operator != FilterOperator::IsEmpty && !values.contains_key(field) {
            return Err(ValidationError::InvalidParameter {
                field: field.clone(),
                message: format!("operator '{}' was given without a filter value", operator),
            });
        }
        operators.insert(field.clone(), operator);
    }

    Ok(normalized
        .into_iter()
        .map(|(field, value)| FieldFilter {
            operator: operators.get(&field).copied(),
            applicable_types: applicable.remove(&field).unwrap_or_default(),
            field,
            value,
        })
        .collect())
}

fn normalize_value(field: &str, value: Option<&Value>) -> ValidationResult<FilterValue> {
    match value {
        None | Some(Value::Null) => Ok(FilterValue::Empty),
        Some(Value::String(s)) if s.is_empty() => Ok(FilterValue::Empty),
        Some(Value::String(s)) => Ok(FilterValue::Text(s.clone())),
        Some(Value::Number(n)) => Ok(FilterValue::Text(n.to_string())),
        Some(Value::Bool(b)) => Ok(FilterValue::Text(b.to_string())),
        Some(Value::Array(_)) | Some(Value::Object(_)) => Err(ValidationError::InvalidParameter {
            field: field.to_string(),
            message: "filter values must be strings, numbers, booleans or null".to_string(),
        }),
    }
}

fn check_output_fields(
    fields: &[String],
    types: &[CollectionType],
    registry: &CollectionRegistry,
    warnings: &mut Vec<SearchWarning>,
) -> ValidationResult<()> {
    if fields.is_empty() {
        return Err(ValidationError::InvalidParameter {
            field: "output".to_string(),
            message: "explicit output field list cannot be empty".to_string(),
        });
    }

    for field in fields {
        if field == ORIGIN_TYPE_FIELD {
            continue;
        }

        let available: Vec<CollectionType> = types
            .iter()
            .copied()
            .filter(|t| registry.is_available(*t, field))
            .collect();

        if available.is_empty() {
            return Err(ValidationError::UnavailableOutputField {
                field: field.clone(),
                types: join_types(types),
            });
        }
        if available.len() < types.len() {
            warnings.push(SearchWarning::for_field(
                WarningCode::PartialOutputField,
                field,
                format!(
                    "output field '{}' is only available in: {}",
                    field,
                    join_types(&available)
                ),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> CollectionRegistry {
        CollectionRegistry::new()
    }

    fn check(request: SearchRequest) -> ValidationResult<NormalizedSearchRequest> {
        validate(&request, &registry(), 50)
    }

    #[test]
    fn test_defaults() {
        let normalized = check(SearchRequest::new("features")).unwrap();
        assert_eq!(normalized.types, vec![CollectionType::Features]);
        assert_eq!(normalized.output, OutputMode::Full);
        assert_eq!(normalized.limit, 50);
        assert_eq!(normalized.offset, 0);
        assert_eq!(normalized.detail, DetailLevel::Standard);
        assert_eq!(normalized.pattern_mode, PatternMode::Wildcard);
        assert!(!normalized.case_sensitive);
        assert!(normalized.include_sub_data);
        assert!(normalized.warnings.is_empty());
    }

    #[test]
    fn test_limit_clamping() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(-7), 1);
        assert_eq!(clamp_limit(500), 100);
        assert_eq!(clamp_limit(42), 42);
        for limit in [-1000, -1, 0, 1, 50, 100, 101, i64::MAX] {
            let clamped = clamp_limit(limit);
            assert!((MIN_LIMIT..=MAX_LIMIT).contains(&clamped));
        }

        let normalized = check(SearchRequest::new("notes").with_limit(500)).unwrap();
        assert_eq!(normalized.limit, 100);
    }

    #[test]
    fn test_offset_floor() {
        let normalized = check(SearchRequest::new("notes").with_offset(-3)).unwrap();
        assert_eq!(normalized.offset, 0);
    }

    #[test]
    fn test_unknown_type_lists_valid_types() {
        let err = check(SearchRequest::new("bugs")).unwrap_err();
        assert_eq!(err.field(), "types");
        assert!(err.to_string().contains("features, notes"));
    }

    #[test]
    fn test_empty_types() {
        let err = check(SearchRequest::for_types(Vec::<String>::new())).unwrap_err();
        assert_eq!(err, ValidationError::EmptyTypes);
    }

    #[test]
    fn test_duplicate_types_collapse() {
        let normalized =
            check(SearchRequest::for_types(["notes", "features", "notes"])).unwrap();
        assert_eq!(
            normalized.types,
            vec![CollectionType::Notes, CollectionType::Features]
        );
    }

    #[test]
    fn test_unsearchable_field_fails() {
        let err = check(SearchRequest::new("features").with_filter("title", "x")).unwrap_err();
        assert!(matches!(err, ValidationError::UnsearchableField { .. }));
        assert_eq!(err.field(), "title");
    }

    #[test]
    fn test_partially_searchable_field_warns() {
        let normalized = check(
            SearchRequest::for_types(["features", "notes"]).with_filter("title", "Login"),
        )
        .unwrap();

        let warning = &normalized.warnings[0];
        assert_eq!(warning.code, WarningCode::PartialFieldSupport);
        assert_eq!(warning.field.as_deref(), Some("title"));
        assert!(warning.message.contains("notes"));
        assert!(!warning.message.contains("features"));
        assert_eq!(
            normalized.filters[0].applicable_types,
            vec![CollectionType::Notes]
        );
    }

    #[test]
    fn test_empty_values_collapse() {
        for value in [json!(null), json!("")] {
            let normalized =
                check(SearchRequest::new("notes").with_filter("title", value)).unwrap();
            assert_eq!(normalized.filters[0].value, FilterValue::Empty);
            assert_eq!(normalized.warnings[0].code, WarningCode::EmptyValueSearch);
        }
    }

    #[test]
    fn test_scalar_values_become_text() {
        let normalized = check(
            SearchRequest::new("features")
                .with_filter("archived", false)
                .with_filter("name", 42),
        )
        .unwrap();
        assert_eq!(
            normalized.filter("archived").unwrap().value,
            FilterValue::Text("false".to_string())
        );
        assert_eq!(
            normalized.filter("name").unwrap().value,
            FilterValue::Text("42".to_string())
        );
    }

    #[test]
    fn test_structured_value_fails() {
        let err = check(SearchRequest::new("features").with_filter("name", json!(["a"])))
            .unwrap_err();
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn test_unknown_operator_fails() {
        let err = check(SearchRequest::new("features").with_filter_op("name", "x", "like"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownOperator { .. }));
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn test_errors_reported_in_rule_order() {
        // unsearchable field wins over an unknown operator on it
        let err = check(SearchRequest::new("features").with_filter_op("title", "x", "like"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnsearchableField { .. }));

        // structured value wins over an unknown operator
        let err = check(SearchRequest::new("features").with_filter_op("name", json!({}), "like"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidParameter { .. }));

        // unknown operator wins over an unavailable output field
        let err = check(
            SearchRequest::new("features")
                .with_filter_op("name", "x", "like")
                .with_output_fields(["nosuchfield"]),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownOperator { .. }));

        // operator-only fields are checked for searchability too
        let mut request = SearchRequest::new("features");
        request
            .operators
            .insert("title".to_string(), "isEmpty".to_string());
        let err = check(request).unwrap_err();
        assert!(matches!(err, ValidationError::UnsearchableField { .. }));
    }

    #[test]
    fn test_special_operators_warn() {
        let normalized = check(
            SearchRequest::new("notes")
                .with_filter_op("title", "x", "isEmpty")
                .with_filter_op("content", "a.*b", "regex")
                .with_filter_op("state", "un*", "wildcard"),
        )
        .unwrap();

        let codes: Vec<WarningCode> = normalized.warnings.iter().map(|w| w.code).collect();
        assert!(codes.contains(&WarningCode::IsEmptyIgnoresValue));
        assert!(codes.contains(&WarningCode::RegexOperator));
        assert!(codes.contains(&WarningCode::WildcardOperator));
    }

    #[test]
    fn test_is_empty_operator_without_value() {
        let mut request = SearchRequest::new("notes");
        request
            .operators
            .insert("title".to_string(), "isEmpty".to_string());
        let normalized = check(request).unwrap();
        assert_eq!(normalized.filters[0].value, FilterValue::Empty);
        assert_eq!(
            normalized.filters[0].operator,
            Some(FilterOperator::IsEmpty)
        );
    }

    #[test]
    fn test_operator_without_value_fails() {
        let mut request = SearchRequest::new("notes");
        request
            .operators
            .insert("title".to_string(), "contains".to_string());
        let err = check(request).unwrap_err();
        assert_eq!(err.field(), "title");
    }

    #[test]
    fn test_invalid_modes() {
        let err = check(SearchRequest::new("notes").with_pattern_mode("glob")).unwrap_err();
        assert_eq!(err.field(), "patternMode");

        let err = check(SearchRequest::new("notes").with_detail("verbose")).unwrap_err();
        assert_eq!(err.field(), "detail");

        let err = check(SearchRequest::new("notes").with_output_mode("everything")).unwrap_err();
        assert_eq!(err.field(), "output");
    }

    #[test]
    fn test_output_fields() {
        let normalized = check(
            SearchRequest::for_types(["products", "features"])
                .with_output_fields(["id", "name", ORIGIN_TYPE_FIELD]),
        )
        .unwrap();
        assert_eq!(
            normalized.output,
            OutputMode::Fields(vec![
                "id".to_string(),
                "name".to_string(),
                ORIGIN_TYPE_FIELD.to_string()
            ])
        );
        assert!(normalized.warnings.is_empty());

        let err = check(SearchRequest::new("users").with_output_fields(["title"])).unwrap_err();
        assert!(matches!(err, ValidationError::UnavailableOutputField { .. }));

        let normalized = check(
            SearchRequest::for_types(["users", "notes"]).with_output_fields(["id", "title"]),
        )
        .unwrap();
        assert_eq!(normalized.warnings[0].code, WarningCode::PartialOutputField);
    }
}
