//! Result and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::collection::CollectionType;

/// Kind of advisory warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningCode {
    /// A filter field is searchable in only some of the requested types.
    PartialFieldSupport,
    /// An empty filter value was supplied.
    EmptyValueSearch,
    /// `isEmpty` ignores the supplied filter value.
    IsEmptyIgnoresValue,
    /// The filter value is interpreted as a regular expression.
    RegexOperator,
    /// The filter value is interpreted as a wildcard pattern.
    WildcardOperator,
    /// An explicit output field exists in only some of the requested types.
    PartialOutputField,
    /// A pattern failed to compile and exact matching is used instead.
    PatternFallback,
    /// A date filter value could not be parsed.
    UnparseableDate,
    /// A fetch loop stopped at the page ceiling.
    PageLimitReached,
    /// A source repeated a page cursor.
    RepeatedCursor,
}

/// An advisory, non-fatal diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchWarning {
    /// Warning kind.
    pub code: WarningCode,

    /// Field the warning is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Human-readable message.
    pub message: String,
}

impl SearchWarning {
    /// Creates a warning about a field.
    pub fn for_field(code: WarningCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates a warning not tied to a field.
    pub fn general(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            field: None,
            message: message.into(),
        }
    }
}

/// Output of one collection's fetch loop.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PerTypeResult {
    /// Records in upstream page order.
    pub records: Vec<Value>,

    /// Number of records retrieved.
    pub total_records: usize,

    /// True when the loop stopped before the source was exhausted.
    pub has_more: bool,

    /// Number of pages requested.
    pub pages_fetched: u32,

    /// Warnings raised by the loop.
    pub warnings: Vec<SearchWarning>,
}

/// Concatenated results of every requested type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregatedResult {
    /// Records tagged with their origin type, in requested-type order.
    pub records: Vec<Value>,

    /// Sum of per-type totals.
    pub total_records: usize,

    /// OR of per-type `has_more`.
    pub has_more: bool,

    /// Warnings from every loop, in requested-type order.
    pub warnings: Vec<SearchWarning>,
}

/// The engine's answer to a search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Shaped records (or bare identifiers for `ids-only`).
    pub data: Vec<Value>,

    /// Records matching every filter, before offset and limit.
    pub total_records: usize,

    /// Length of `data`.
    pub returned_records: usize,

    /// True when more matching records exist than were returned.
    pub has_more: bool,

    /// Effective offset.
    pub offset: u32,

    /// Effective limit.
    pub limit: u32,

    /// Advisory warnings.
    pub warnings: Vec<SearchWarning>,

    /// Suggestions for refining the search.
    pub hints: Vec<String>,

    /// One-line summary.
    pub message: String,
}

impl SearchResponse {
    /// Returns warnings of the given kind.
    pub fn warnings_of(&self, code: WarningCode) -> impl Iterator<Item = &SearchWarning> {
        self.warnings.iter().filter(move |w| w.code == code)
    }
}
