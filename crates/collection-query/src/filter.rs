//! Client-side filter engine.
//!
//! Filters are compiled once per request into a [`FilterSet`] and then
//! evaluated against every fetched record. A record survives only if it
//! matches every filter.
//!
//! Field paths are resolved with [`path::resolve_all`], so a filter on
//! `tags` or `components.name` matches when any reached value matches. A path
//! that reaches nothing behaves as an empty value.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ValidationResult;
use crate::path;
use crate::pattern::{Anchor, Pattern, PatternLimits, compile_with_fallback, mode_for};
use crate::types::{
    FieldFilter, FilterOperator, NormalizedSearchRequest, SearchWarning, WarningCode,
};

/// How a compiled filter decides a match.
#[derive(Debug, Clone)]
enum Matcher {
    /// Field is missing, null or empty.
    Emptiness,
    /// Any textual value matches the pattern.
    Pattern(Pattern),
    /// Any value parses as a date before the bound.
    Before(Option<DateTime<Utc>>),
    /// Any value parses as a date after the bound.
    After(Option<DateTime<Utc>>),
}

/// One filter ready for evaluation.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    field: String,
    operator: FilterOperator,
    matcher: Matcher,
}

impl CompiledFilter {
    /// Returns the filtered field path.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the effective operator.
    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    /// Returns true if `record` satisfies this filter.
    pub fn matches(&self, record: &Value) -> bool {
        let values = path::resolve_all(record, &self.field);

        match &self.matcher {
            Matcher::Emptiness => values.iter().all(|v| is_empty_value(v)),
            Matcher::Pattern(pattern) => values
                .iter()
                .any(|v| texts(v).iter().any(|text| pattern.test(text))),
            Matcher::Before(bound) => bound.is_some_and(|bound| {
                values
                    .iter()
                    .any(|v| texts(v).iter().filter_map(|t| parse_date(t)).any(|d| d < bound))
            }),
            Matcher::After(bound) => bound.is_some_and(|bound| {
                values
                    .iter()
                    .any(|v| texts(v).iter().filter_map(|t| parse_date(t)).any(|d| d > bound))
            }),
        }
    }
}

/// Every filter of a request, compiled.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<CompiledFilter>,
    warnings: Vec<SearchWarning>,
}

impl FilterSet {
    /// Compiles every filter of `request`.
    ///
    /// Runs before any fetch so that a rejected pattern costs nothing
    /// upstream.
    ///
    /// # Errors
    ///
    /// Returns [`PatternTooComplex`](crate::error::ValidationError::PatternTooComplex)
    /// when a filter value exceeds `limits`.
    pub fn compile(
        request: &NormalizedSearchRequest,
        limits: &PatternLimits,
    ) -> ValidationResult<Self> {
        let mut set = Self::default();

        for filter in &request.filters {
            let compiled = set.compile_one(filter, request, limits)?;
            set.filters.push(compiled);
        }

        debug!(filters = set.filters.len(), "Compiled filters");
        Ok(set)
    }

    fn compile_one(
        &mut self,
        filter: &FieldFilter,
        request: &NormalizedSearchRequest,
        limits: &PatternLimits,
    ) -> ValidationResult<CompiledFilter> {
        let operator = filter.effective_operator();
        let value = filter.value.as_text().unwrap_or_default();

        let matcher = if filter.tests_emptiness() {
            Matcher::Emptiness
        } else if operator.is_temporal() {
            let bound = parse_date(value);
            if bound.is_none() {
                warn!(field = %filter.field, value, "Unparseable date filter");
                self.warnings.push(SearchWarning::for_field(
                    WarningCode::UnparseableDate,
                    &filter.field,
                    format!(
                        "'{}' is not a date (use YYYY-MM-DD or RFC 3339); the {} filter on '{}' matches nothing",
                        value, operator, filter.field
                    ),
                ));
            }
            if operator == FilterOperator::Before {
                Matcher::Before(bound)
            } else {
                Matcher::After(bound)
            }
        } else {
            let (pattern, warning) = compile_with_fallback(
                &filter.field,
                value,
                mode_for(operator, request.pattern_mode),
                Anchor::for_operator(operator),
                request.case_sensitive,
                limits,
            )?;
            self.warnings.extend(warning);
            debug!(
                field = %filter.field,
                value = pattern.source(),
                mode = %pattern.mode(),
                anchor = ?pattern.anchor(),
                case_sensitive = pattern.is_case_sensitive(),
                "Compiled filter pattern"
            );
            Matcher::Pattern(pattern)
        };

        Ok(CompiledFilter {
            field: filter.field.clone(),
            operator,
            matcher,
        })
    }

    /// Returns warnings raised while compiling.
    pub fn warnings(&self) -> &[SearchWarning] {
        &self.warnings
    }

    /// Returns true if there is nothing to evaluate.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns true if `record` matches every filter not in `skip`.
    pub fn matches(&self, record: &Value, skip: &BTreeSet<String>) -> bool {
        self.filters
            .iter()
            .filter(|f| !skip.contains(&f.field))
            .all(|f| f.matches(record))
    }
}

/// Keeps the records that match every filter.
///
/// In a single-type search, filters the list source already applied
/// (`server_applied`) are not evaluated again. In a multi-type search every
/// filter is evaluated, since server-side support differs between types.
pub fn filter(
    records: Vec<Value>,
    request: &NormalizedSearchRequest,
    filters: &FilterSet,
    server_applied: &BTreeSet<String>,
) -> Vec<Value> {
    if filters.is_empty() {
        return records;
    }

    let none = BTreeSet::new();
    let skip = if request.is_multi_type() {
        &none
    } else {
        server_applied
    };

    let before = records.len();
    let kept: Vec<Value> = records
        .into_iter()
        .filter(|record| filters.matches(record, skip))
        .collect();

    debug!(
        before,
        after = kept.len(),
        skipped = skip.len(),
        "Applied client-side filters"
    );
    kept
}

/// Returns true for null, empty strings and empty arrays.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.iter().all(is_empty_value),
        _ => false,
    }
}

/// Returns the textual forms of a record value.
///
/// Objects and nulls have none; arrays contribute each element.
fn texts(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Number(n) => vec![n.to_string()],
        Value::Bool(b) => vec![b.to_string()],
        Value::Array(items) => items.iter().flat_map(texts).collect(),
        _ => Vec::new(),
    }
}

/// Parses an RFC 3339 timestamp, a `YYYY-MM-DD` date (midnight UTC) or a
/// naive `YYYY-MM-DDTHH:MM:SS[.f]` timestamp (UTC).
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.and_utc())
}
