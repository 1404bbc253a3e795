//! Validated search request types.
//!
//! These are produced by the validator and are the only request shape the
//! fetch, filter and shaping stages see.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::collection::CollectionType;
use super::response::SearchWarning;

/// Match operators that can be applied to a filter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    /// Pattern matches the whole value (default).
    Equals,
    /// Pattern matches anywhere in the value.
    Contains,
    /// Value is missing, null or empty; the filter value is ignored.
    IsEmpty,
    /// Pattern matches at the start of the value.
    StartsWith,
    /// Pattern matches at the end of the value.
    EndsWith,
    /// Value is a date before the filter date.
    Before,
    /// Value is a date after the filter date.
    After,
    /// Filter value is a regular expression.
    Regex,
    /// Filter value is a wildcard pattern.
    Wildcard,
}

impl FilterOperator {
    /// Every supported operator.
    pub const ALL: [FilterOperator; 9] = [
        FilterOperator::Equals,
        FilterOperator::Contains,
        FilterOperator::IsEmpty,
        FilterOperator::StartsWith,
        FilterOperator::EndsWith,
        FilterOperator::Before,
        FilterOperator::After,
        FilterOperator::Regex,
        FilterOperator::Wildcard,
    ];

    /// Returns the wire name of this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::Contains => "contains",
            FilterOperator::IsEmpty => "isEmpty",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::Before => "before",
            FilterOperator::After => "after",
            FilterOperator::Regex => "regex",
            FilterOperator::Wildcard => "wildcard",
        }
    }

    /// Parses an operator name, returning None for unknown operators.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_str() == s.trim())
    }

    /// Returns a comma-separated list of all operator names.
    pub fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(|op| op.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns true for operators that compare dates.
    pub fn is_temporal(&self) -> bool {
        matches!(self, FilterOperator::Before | FilterOperator::After)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a filter value is compiled into a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PatternMode {
    /// Literal comparison.
    Exact,
    /// `*` and `?` wildcards (default).
    #[default]
    Wildcard,
    /// Regular expression.
    Regex,
}

impl fmt::Display for PatternMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternMode::Exact => write!(f, "exact"),
            PatternMode::Wildcard => write!(f, "wildcard"),
            PatternMode::Regex => write!(f, "regex"),
        }
    }
}

impl FromStr for PatternMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(PatternMode::Exact),
            "wildcard" => Ok(PatternMode::Wildcard),
            "regex" => Ok(PatternMode::Regex),
            _ => Err(format!(
                "unknown pattern mode '{}'; expected exact, wildcard or regex",
                s
            )),
        }
    }
}

/// Verbosity preset for summary output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Identifier and display name only.
    Basic,
    /// The curated summary fields (default).
    #[default]
    Standard,
    /// Curated fields plus timestamps.
    Full,
}

impl FromStr for DetailLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(DetailLevel::Basic),
            "standard" => Ok(DetailLevel::Standard),
            "full" => Ok(DetailLevel::Full),
            _ => Err(format!(
                "unknown detail level '{}'; expected basic, standard or full",
                s
            )),
        }
    }
}

/// Resolved output shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Bare identifiers.
    IdsOnly,
    /// Curated per-type summary.
    Summary,
    /// Records as fetched.
    Full,
    /// Explicit dot-path projection.
    Fields(Vec<String>),
}

impl OutputMode {
    /// Parses a named output mode.
    pub fn parse_mode(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ids-only" => Some(OutputMode::IdsOnly),
            "summary" => Some(OutputMode::Summary),
            "full" => Some(OutputMode::Full),
            _ => None,
        }
    }

    /// Returns the name of this mode.
    pub fn name(&self) -> &'static str {
        match self {
            OutputMode::IdsOnly => "ids-only",
            OutputMode::Summary => "summary",
            OutputMode::Full => "full",
            OutputMode::Fields(_) => "fields",
        }
    }
}

/// A normalized filter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterValue {
    /// The caller asked for `null`, nothing, or an empty string.
    Empty,
    /// A non-empty text value.
    Text(String),
}

impl FilterValue {
    /// Returns the text, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Empty => None,
            FilterValue::Text(text) => Some(text),
        }
    }

    /// Returns true for the empty marker.
    pub fn is_empty(&self) -> bool {
        matches!(self, FilterValue::Empty)
    }
}

/// One validated filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    /// Dot-path of the filtered field.
    pub field: String,

    /// Normalized filter value.
    pub value: FilterValue,

    /// Declared operator; `None` means the default equality.
    pub operator: Option<FilterOperator>,

    /// Requested types in which the field is searchable.
    pub applicable_types: Vec<CollectionType>,
}

impl FieldFilter {
    /// Returns the effective operator.
    pub fn effective_operator(&self) -> FilterOperator {
        self.operator.unwrap_or(FilterOperator::Equals)
    }

    /// Returns true when the filter is an emptiness test.
    pub fn tests_emptiness(&self) -> bool {
        match self.effective_operator() {
            FilterOperator::IsEmpty => true,
            FilterOperator::Equals => self.value.is_empty(),
            _ => false,
        }
    }
}

/// A validated, defaulted search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSearchRequest {
    /// Requested types, non-empty, in request order without duplicates.
    pub types: Vec<CollectionType>,

    /// Validated filters.
    pub filters: Vec<FieldFilter>,

    /// Resolved output mode.
    pub output: OutputMode,

    /// Clamped to `[1, 100]`.
    pub limit: u32,

    /// Floored at 0.
    pub offset: u32,

    /// Summary verbosity.
    pub detail: DetailLevel,

    /// Whether nested sub-data is kept in full output.
    pub include_sub_data: bool,

    /// Default pattern mode.
    pub pattern_mode: PatternMode,

    /// Whether matching is case sensitive.
    pub case_sensitive: bool,

    /// Advisory warnings gathered during validation.
    pub warnings: Vec<SearchWarning>,
}

impl NormalizedSearchRequest {
    /// Returns true when more than one type was requested.
    pub fn is_multi_type(&self) -> bool {
        self.types.len() > 1
    }

    /// Looks up the filter for a field.
    pub fn filter(&self, field: &str) -> Option<&FieldFilter> {
        self.filters.iter().find(|f| f.field == field)
    }
}
