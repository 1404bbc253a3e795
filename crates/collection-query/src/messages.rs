//! Response message and hints.

use crate::pattern::has_wildcards;
use crate::types::{
    NormalizedSearchRequest, OutputMode, PatternMode, SearchWarning, WarningCode, join_types,
};

/// Final counts of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    /// Records matching every filter.
    pub matched: usize,
    /// Records returned after offset and limit.
    pub returned: usize,
    /// More matching records exist than were returned.
    pub has_more: bool,
}

/// Builds the one-line summary.
pub fn message(request: &NormalizedSearchRequest, counts: Counts) -> String {
    let mut message = format!(
        "Found {} {} (showing {})",
        counts.matched,
        join_types(&request.types),
        counts.returned
    );

    if !request.filters.is_empty() {
        let fields: Vec<&str> = request.filters.iter().map(|f| f.field.as_str()).collect();
        message.push_str(" matching ");
        message.push_str(&fields.join(", "));
    }

    message
}

/// Builds suggestions for refining the search.
pub fn hints(
    request: &NormalizedSearchRequest,
    counts: Counts,
    warnings: &[SearchWarning],
) -> Vec<String> {
    let mut hints = Vec::new();

    if counts.matched == 0 {
        if request.filters.is_empty() {
            hints.push(format!(
                "No {} records were returned by the source",
                join_types(&request.types)
            ));
        } else {
            hints.push(
                "No records matched; try a wildcard such as '*term*' or the 'contains' operator"
                    .to_string(),
            );
            if request.case_sensitive {
                hints.push(
                    "Matching is case sensitive; set caseSensitive=false to ignore case"
                        .to_string(),
                );
            }
        }
    }

    let truncated = warnings.iter().any(|w| {
        matches!(
            w.code,
            WarningCode::PageLimitReached | WarningCode::RepeatedCursor
        )
    });
    let next_offset = request.offset as usize + counts.returned;

    if counts.has_more && next_offset < counts.matched {
        hints.push(format!(
            "More results are available; request offset={} for the next page",
            next_offset
        ));
    }

    if truncated {
        hints.push(
            "Not every upstream page was read; add more specific filters to narrow the search"
                .to_string(),
        );
    }

    if request.output == OutputMode::IdsOnly && request.is_multi_type() {
        hints.push(
            "ids-only output drops the origin type; request the fields [\"id\", \"_collectionType\"] to keep it"
                .to_string(),
        );
    }

    if request.pattern_mode == PatternMode::Exact
        && request
            .filters
            .iter()
            .filter_map(|f| f.value.as_text())
            .any(has_wildcards)
    {
        hints.push(
            "Filter values contain '*' or '?' but patternMode is exact; use patternMode=wildcard to treat them as wildcards"
                .to_string(),
        );
    }

    for filter in &request.filters {
        if filter.applicable_types.len() < request.types.len() && !filter.tests_emptiness() {
            hints.push(format!(
                "'{}' is only searchable in {}; records of other types never match it",
                filter.field,
                join_types(&filter.applicable_types)
            ));
        }
    }

    hints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CollectionRegistry;
    use crate::types::SearchRequest;
    use crate::validation::validate;

    fn normalize(request: SearchRequest) -> NormalizedSearchRequest {
        validate(&request, &CollectionRegistry::new(), 50).unwrap()
    }

    fn counts(matched: usize, returned: usize, has_more: bool) -> Counts {
        Counts {
            matched,
            returned,
            has_more,
        }
    }

    #[test]
    fn test_message() {
        let request = normalize(SearchRequest::for_types(["products", "features"]));
        assert_eq!(
            message(&request, counts(6, 2, true)),
            "Found 6 products, features (showing 2)"
        );

        let request = normalize(SearchRequest::new("features").with_filter("name", "Dark*"));
        assert_eq!(
            message(&request, counts(1, 1, false)),
            "Found 1 features (showing 1) matching name"
        );
    }

    #[test]
    fn test_zero_result_hints() {
        let request = normalize(
            SearchRequest::new("features")
                .with_filter("name", "Dark")
                .with_case_sensitive(true),
        );
        let hints = hints(&request, counts(0, 0, false), &[]);
        assert_eq!(hints.len(), 2);
        assert!(hints[0].contains("contains"));
        assert!(hints[1].contains("caseSensitive"));
    }

    #[test]
    fn test_has_more_hint() {
        let request = normalize(SearchRequest::new("features").with_limit(2).with_offset(4));
        let hints = hints(&request, counts(10, 2, true), &[]);
        assert!(hints[0].contains("offset=6"));
    }

    #[test]
    fn test_truncation_hint() {
        let request = normalize(SearchRequest::new("features"));
        let warning = SearchWarning::general(WarningCode::PageLimitReached, "stopped");
        let hints = hints(&request, counts(5, 5, true), &[warning]);
        assert_eq!(hints.len(), 1);
        assert!(hints[0].contains("upstream"));
    }

    #[test]
    fn test_ids_only_multi_type_hint() {
        let request = normalize(
            SearchRequest::for_types(["products", "features"]).with_output_mode("ids-only"),
        );
        let hints = hints(&request, counts(3, 3, false), &[]);
        assert!(hints[0].contains("_collectionType"));
    }

    #[test]
    fn test_exact_mode_wildcard_hint() {
        let request = normalize(
            SearchRequest::new("features")
                .with_filter("name", "Dark*")
                .with_pattern_mode("exact"),
        );
        let hints = hints(&request, counts(1, 1, false), &[]);
        assert!(hints[0].contains("patternMode=wildcard"));
    }

    #[test]
    fn test_partial_field_hint_names_applicable_types() {
        let request = normalize(
            SearchRequest::for_types(["features", "notes"]).with_filter("title", "Login*"),
        );
        let hints = hints(&request, counts(1, 1, false), &[]);
        assert_eq!(hints.len(), 1);
        assert!(hints[0].contains("'title' is only searchable in notes"));

        let request = normalize(
            SearchRequest::for_types(["features", "notes"])
                .with_filter_op("title", "", "isEmpty"),
        );
        assert!(super::hints(&request, counts(3, 3, false), &[]).is_empty());
    }
}
