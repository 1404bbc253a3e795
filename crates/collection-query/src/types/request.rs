//! Raw search request types.
//!
//! [`SearchRequest`] is the caller-facing wire shape. Nothing in it is trusted
//! until it has gone through [`validate`](crate::validation::validate).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A value that may be given as a single item or as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single item.
    One(T),
    /// A list of items.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Converts to list form.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

/// Requested output shape: a named mode or an explicit list of field paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputSpec {
    /// `ids-only`, `summary` or `full`.
    Mode(String),
    /// Explicit dot-path fields.
    Fields(Vec<String>),
}

/// A raw search request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Collection type name(s) to search.
    #[serde(default)]
    pub types: OneOrMany<String>,

    /// Filter values keyed by field path.
    #[serde(default)]
    pub filters: BTreeMap<String, Value>,

    /// Match operators keyed by field path.
    #[serde(default)]
    pub operators: BTreeMap<String, String>,

    /// Output shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputSpec>,

    /// Maximum number of records to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,

    /// Number of matching records to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,

    /// Verbosity preset for summary output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Whether nested sub-data is kept in full output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_sub_data: Option<bool>,

    /// Default pattern mode for filter values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_mode: Option<String>,

    /// Whether pattern matching is case sensitive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
}

impl SearchRequest {
    /// Creates a request for a single collection type.
    pub fn new(collection_type: impl Into<String>) -> Self {
        Self {
            types: OneOrMany::One(collection_type.into()),
            ..Default::default()
        }
    }

    /// Creates a request over several collection types.
    pub fn for_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: OneOrMany::Many(types.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Adds a filter value.
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Adds a filter value together with its operator.
    pub fn with_filter_op(
        mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
        operator: impl Into<String>,
    ) -> Self {
        let field = field.into();
        self.operators.insert(field.clone(), operator.into());
        self.filters.insert(field, value.into());
        self
    }

    /// Sets a named output mode.
    pub fn with_output_mode(mut self, mode: impl Into<String>) -> Self {
        self.output = Some(OutputSpec::Mode(mode.into()));
        self
    }

    /// Sets an explicit output field list.
    pub fn with_output_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output = Some(OutputSpec::Fields(
            fields.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Sets the limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the detail level.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Sets the pattern mode.
    pub fn with_pattern_mode(mut self, mode: impl Into<String>) -> Self {
        self.pattern_mode = Some(mode.into());
        self
    }

    /// Sets case sensitivity.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = Some(case_sensitive);
        self
    }

    /// Sets whether sub-data is kept in full output.
    pub fn with_sub_data(mut self, include: bool) -> Self {
        self.include_sub_data = Some(include);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_single_type_and_mode() {
        let req: SearchRequest = serde_json::from_value(json!({
            "types": "notes",
            "filters": {"title": ""},
            "operators": {"title": "isEmpty"},
            "output": "summary",
            "patternMode": "exact",
            "caseSensitive": true
        }))
        .unwrap();

        assert_eq!(req.types, OneOrMany::One("notes".to_string()));
        assert_eq!(req.output, Some(OutputSpec::Mode("summary".to_string())));
        assert_eq!(req.operators.get("title").map(String::as_str), Some("isEmpty"));
        assert_eq!(req.pattern_mode.as_deref(), Some("exact"));
        assert_eq!(req.case_sensitive, Some(true));
    }

    #[test]
    fn test_deserialize_type_list_and_fields() {
        let req: SearchRequest = serde_json::from_value(json!({
            "types": ["products", "features"],
            "output": ["id", "name"],
            "limit": 2,
            "includeSubData": false
        }))
        .unwrap();

        assert_eq!(
            req.types.into_vec(),
            vec!["products".to_string(), "features".to_string()]
        );
        assert_eq!(
            req.output,
            Some(OutputSpec::Fields(vec!["id".to_string(), "name".to_string()]))
        );
        assert_eq!(req.limit, Some(2));
        assert_eq!(req.include_sub_data, Some(false));
    }

    #[test]
    fn test_builder() {
        let req = SearchRequest::new("features")
            .with_filter("name", "Dark*")
            .with_filter_op("status.name", "Done", "equals")
            .with_limit(10);

        assert_eq!(req.filters.len(), 2);
        assert_eq!(req.operators.len(), 1);
        assert_eq!(req.limit, Some(10));
    }
}
