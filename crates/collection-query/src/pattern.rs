//! Filter pattern compilation.
//!
//! A filter value is compiled once per request into a [`Pattern`]: a regular
//! expression built from the value according to its [`PatternMode`] and
//! anchored according to the filter operator.
//!
//! | mode | value is |
//! |------|----------|
//! | `exact` | matched literally |
//! | `wildcard` | `*` matches any run of characters, `?` exactly one |
//! | `regex` | used as a regular expression |
//!
//! Wildcard and regex values are checked against [`PatternLimits`] before they
//! are compiled. A value that still fails to compile falls back to exact
//! matching, see [`compile_with_fallback`].

use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::warn;

use crate::config::EngineConfig;
use crate::error::{ValidationError, ValidationResult};
use crate::types::{FilterOperator, PatternMode, SearchWarning, WarningCode};

/// Upper bound on the compiled size of a single pattern.
const COMPILED_SIZE_LIMIT: usize = 1 << 20;

/// Structural limits applied to wildcard and regex values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternLimits {
    /// Longest accepted value, in characters.
    pub max_length: usize,

    /// Most repetition operators accepted in one value.
    pub max_repetitions: usize,
}

impl PatternLimits {
    /// Reads the limits from the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_length: config.max_pattern_length,
            max_repetitions: config.max_pattern_repetitions,
        }
    }
}

impl Default for PatternLimits {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Which part of the value a pattern has to cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The whole value.
    Full,
    /// A prefix of the value.
    Start,
    /// A suffix of the value.
    End,
    /// Any substring of the value.
    Anywhere,
}

impl Anchor {
    /// Returns the anchoring used for an operator.
    pub fn for_operator(operator: FilterOperator) -> Self {
        match operator {
            FilterOperator::Contains | FilterOperator::Regex => Anchor::Anywhere,
            FilterOperator::StartsWith => Anchor::Start,
            FilterOperator::EndsWith => Anchor::End,
            _ => Anchor::Full,
        }
    }
}

/// Returns the compilation mode for an operator.
///
/// `regex` and `wildcard` force their own mode; every other operator follows
/// the request's pattern mode.
pub fn mode_for(operator: FilterOperator, default: PatternMode) -> PatternMode {
    match operator {
        FilterOperator::Regex => PatternMode::Regex,
        FilterOperator::Wildcard => PatternMode::Wildcard,
        _ => default,
    }
}

/// Returns true if `value` contains wildcard metacharacters.
pub fn has_wildcards(value: &str) -> bool {
    value.contains(['*', '?'])
}

/// Pattern compilation failures.
#[derive(Error, Debug)]
pub enum PatternError {
    /// The value exceeds the structural limits.
    #[error("{0}")]
    TooComplex(String),

    /// The value did not compile.
    #[error(transparent)]
    Invalid(#[from] regex::Error),
}

/// A compiled match predicate.
#[derive(Debug, Clone)]
pub struct Pattern {
    mode: PatternMode,
    anchor: Anchor,
    case_sensitive: bool,
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source` in the given mode.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::TooComplex`] when a wildcard or regex value
    /// exceeds `limits`, and [`PatternError::Invalid`] when it does not compile.
    pub fn compile(
        source: &str,
        mode: PatternMode,
        anchor: Anchor,
        case_sensitive: bool,
        limits: &PatternLimits,
    ) -> Result<Self, PatternError> {
        if mode != PatternMode::Exact {
            check_complexity(source, mode, limits)?;
        }

        let body = match mode {
            PatternMode::Exact => regex::escape(source),
            PatternMode::Wildcard => wildcard_to_regex(source),
            PatternMode::Regex => source.to_string(),
        };

        Ok(Self {
            mode,
            anchor,
            case_sensitive,
            source: source.to_string(),
            regex: build(&body, anchor, case_sensitive)?,
        })
    }

    /// Compiles a literal match for `source`.
    pub fn exact(source: &str, anchor: Anchor, case_sensitive: bool) -> Result<Self, PatternError> {
        Self::compile(
            source,
            PatternMode::Exact,
            anchor,
            case_sensitive,
            &PatternLimits::default(),
        )
    }

    /// Returns true if `text` matches.
    pub fn test(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Returns the mode the pattern was compiled in.
    pub fn mode(&self) -> PatternMode {
        self.mode
    }

    /// Returns the anchoring.
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Returns true if matching is case sensitive.
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Returns the filter value the pattern was built from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Compiles the pattern for one filter field.
///
/// A value that fails to compile is matched literally instead, and a
/// [`WarningCode::PatternFallback`] warning is returned alongside.
///
/// # Errors
///
/// Returns [`ValidationError::PatternTooComplex`] when the value exceeds
/// `limits`.
pub fn compile_with_fallback(
    field: &str,
    value: &str,
    mode: PatternMode,
    anchor: Anchor,
    case_sensitive: bool,
    limits: &PatternLimits,
) -> ValidationResult<(Pattern, Option<SearchWarning>)> {
    match Pattern::compile(value, mode, anchor, case_sensitive, limits) {
        Ok(pattern) => Ok((pattern, None)),
        Err(PatternError::TooComplex(reason)) => Err(ValidationError::PatternTooComplex {
            field: field.to_string(),
            reason,
        }),
        Err(PatternError::Invalid(err)) => {
            warn!(field, mode = %mode, error = %err, "Pattern failed to compile, using exact match");
            let pattern = Pattern::exact(value, anchor, case_sensitive).map_err(|err| {
                ValidationError::PatternTooComplex {
                    field: field.to_string(),
                    reason: err.to_string(),
                }
            })?;
            let warning = SearchWarning::for_field(
                WarningCode::PatternFallback,
                field,
                format!(
                    "{} pattern for '{}' is invalid ({}); matching it literally",
                    mode,
                    field,
                    first_line(&err.to_string())
                ),
            );
            Ok((pattern, Some(warning)))
        }
    }
}

fn first_line(message: &str) -> &str {
    message
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or(message)
}

/// Translates a wildcard value into a regular expression body.
pub fn wildcard_to_regex(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 2);
    let mut buf = [0u8; 4];
    for c in value.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            _ => out.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    out
}

fn build(body: &str, anchor: Anchor, case_sensitive: bool) -> Result<Regex, regex::Error> {
    let anchored = match anchor {
        Anchor::Full => format!(r"\A(?:{})\z", body),
        Anchor::Start => format!(r"\A(?:{})", body),
        Anchor::End => format!(r"(?:{})\z", body),
        Anchor::Anywhere => body.to_string(),
    };

    RegexBuilder::new(&anchored)
        .case_insensitive(!case_sensitive)
        .dot_matches_new_line(true)
        .size_limit(COMPILED_SIZE_LIMIT)
        .build()
}

/// Rejects values whose structure could make matching expensive.
fn check_complexity(
    value: &str,
    mode: PatternMode,
    limits: &PatternLimits,
) -> Result<(), PatternError> {
    let length = value.chars().count();
    if length > limits.max_length {
        return Err(PatternError::TooComplex(format!(
            "pattern is {} characters long, the limit is {}",
            length, limits.max_length
        )));
    }

    let shape = match mode {
        PatternMode::Regex => scan_regex(value),
        _ => RegexShape {
            repetitions: value.matches('*').count(),
            nested_quantifier: false,
        },
    };

    if shape.repetitions > limits.max_repetitions {
        return Err(PatternError::TooComplex(format!(
            "pattern has {} repetition operators, the limit is {}",
            shape.repetitions, limits.max_repetitions
        )));
    }

    if shape.nested_quantifier {
        return Err(PatternError::TooComplex(
            "pattern repeats a group that itself contains a repetition".to_string(),
        ));
    }

    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RegexShape {
    repetitions: usize,
    nested_quantifier: bool,
}

/// Counts quantifiers and finds quantified groups containing quantifiers.
///
/// Escapes and character classes are skipped. A `?` opening a group or
/// following another quantifier is a modifier, not a repetition.
fn scan_regex(value: &str) -> RegexShape {
    let chars: Vec<char> = value.chars().collect();
    let mut shape = RegexShape::default();
    // one entry per open group: whether it contains a quantifier
    let mut groups: Vec<bool> = Vec::new();
    let mut prev_quantifier = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let mut is_quantifier = false;

        match c {
            '\\' => i += 1,
            '[' => {
                i += 1;
                if chars.get(i) == Some(&'^') {
                    i += 1;
                }
                if chars.get(i) == Some(&']') {
                    i += 1;
                }
                while i < chars.len() && chars[i] != ']' {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            '(' => {
                groups.push(false);
                if chars.get(i + 1) == Some(&'?') {
                    i += 1;
                }
            }
            ')' => {
                let inner = groups.pop().unwrap_or(false);
                let quantified = matches!(chars.get(i + 1), Some('*' | '+' | '?' | '{'));
                if inner && quantified {
                    shape.nested_quantifier = true;
                }
                if inner {
                    if let Some(parent) = groups.last_mut() {
                        *parent = true;
                    }
                }
            }
            '?' if prev_quantifier => {}
            '*' | '+' | '?' => is_quantifier = true,
            '{' if chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()) => {
                is_quantifier = true;
                while i < chars.len() && chars[i] != '}' {
                    i += 1;
                }
            }
            _ => {}
        }

        if is_quantifier {
            shape.repetitions += 1;
            if let Some(group) = groups.last_mut() {
                *group = true;
            }
        }
        prev_quantifier = is_quantifier;
        i += 1;
    }

    shape
}
