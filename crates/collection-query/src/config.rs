//! Engine configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `COLLECTION_QUERY_MAX_PAGES` | 50 | Page ceiling per collection fetch loop |
//! | `COLLECTION_QUERY_PAGE_SIZE` | 100 | Page size requested from list sources |
//! | `COLLECTION_QUERY_DEFAULT_LIMIT` | 50 | Result limit when the request gives none |
//! | `COLLECTION_QUERY_MAX_PATTERN_LENGTH` | 256 | Longest accepted wildcard/regex pattern |
//! | `COLLECTION_QUERY_MAX_PATTERN_REPETITIONS` | 16 | Most repetition operators in one pattern |
//! | `COLLECTION_QUERY_LOG_LEVEL` | info | Log level |
//!
//! # Example
//!
//! ```rust
//! use collection_query::EngineConfig;
//!
//! let config = EngineConfig {
//!     max_pages: 10,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use clap::Parser;

use crate::validation::{MAX_LIMIT, MIN_LIMIT};

/// Search engine configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "collection-query")]
#[command(about = "Multi-collection search engine")]
pub struct EngineConfig {
    /// Maximum pages fetched per collection before stopping with `has_more`.
    #[arg(long, env = "COLLECTION_QUERY_MAX_PAGES", default_value = "50")]
    pub max_pages: u32,

    /// Page size requested from list sources.
    #[arg(long, env = "COLLECTION_QUERY_PAGE_SIZE", default_value = "100")]
    pub page_size: u32,

    /// Result limit used when a request does not specify one.
    #[arg(long, env = "COLLECTION_QUERY_DEFAULT_LIMIT", default_value = "50")]
    pub default_limit: u32,

    /// Longest wildcard or regex pattern accepted.
    #[arg(long, env = "COLLECTION_QUERY_MAX_PATTERN_LENGTH", default_value = "256")]
    pub max_pattern_length: usize,

    /// Most repetition operators accepted in one pattern.
    #[arg(long, env = "COLLECTION_QUERY_MAX_PATTERN_REPETITIONS", default_value = "16")]
    pub max_pattern_repetitions: usize,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "COLLECTION_QUERY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            page_size: 100,
            default_limit: 50,
            max_pattern_length: 256,
            max_pattern_repetitions: 16,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration from environment variables, falling back to
    /// defaults when they cannot be parsed.
    pub fn from_env() -> Self {
        Self::try_parse_from(["collection-query"]).unwrap_or_default()
    }

    /// Validates the configuration and returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_pages == 0 {
            errors.push("Max pages cannot be 0".to_string());
        }

        if self.page_size == 0 {
            errors.push("Page size cannot be 0".to_string());
        }

        if !(MIN_LIMIT..=MAX_LIMIT).contains(&self.default_limit) {
            errors.push(format!(
                "Default limit must be between {} and {}",
                MIN_LIMIT, MAX_LIMIT
            ));
        }

        if self.max_pattern_length == 0 {
            errors.push("Max pattern length cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// Uses a small page size and page ceiling so pagination paths are
    /// exercised with small fixtures.
    pub fn for_testing() -> Self {
        Self {
            max_pages: 5,
            page_size: 2,
            default_limit: 50,
            max_pattern_length: 64,
            max_pattern_repetitions: 8,
            log_level: "debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.max_pages, 50);
        assert_eq!(config.default_limit, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_values() {
        let config = EngineConfig {
            max_pages: 0,
            page_size: 0,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("Max pages")));
    }

    #[test]
    fn test_validate_default_limit_range() {
        let config = EngineConfig {
            default_limit: 500,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert!(errors[0].contains("Default limit"));
    }

    #[test]
    fn test_for_testing() {
        let config = EngineConfig::for_testing();
        assert_eq!(config.page_size, 2);
        assert!(config.validate().is_ok());
    }
}
