//! Page types exchanged with paged-list sources.
//!
//! Sources answer in one of three shapes: a bare array (terminal), an envelope
//! object with a `data` member and an optional next indicator, or a single bare
//! record (terminal). [`NormalizedPage::from_value`] folds all three into one
//! shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SourceError;

/// Envelope keys checked, in order, for the next-page indicator.
const NEXT_KEYS: &[&str] = &["next", "nextCursor", "pageCursor"];

/// Position of the next page to request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageToken {
    /// Opaque cursor (or next-page URL) handed back by the source.
    Cursor(String),
    /// Record offset.
    Offset(u64),
}

/// A single call to a paged-list source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Requested page size.
    pub limit: u32,

    /// Where to continue from; `None` for the first page.
    pub token: Option<PageToken>,

    /// Upstream query parameters for server-side filtering.
    pub params: BTreeMap<String, String>,
}

impl PageRequest {
    /// Creates a request for the first page.
    pub fn first(limit: u32, params: BTreeMap<String, String>) -> Self {
        Self {
            limit,
            token: None,
            params,
        }
    }

    /// Returns the same request positioned at `token`.
    pub fn at(&self, token: PageToken) -> Self {
        Self {
            limit: self.limit,
            token: Some(token),
            params: self.params.clone(),
        }
    }

    /// Returns the offset this request starts at (0 for cursors).
    pub fn start_offset(&self) -> u64 {
        match self.token {
            Some(PageToken::Offset(offset)) => offset,
            _ => 0,
        }
    }
}

/// One page in normalized form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedPage {
    /// Records in upstream order.
    pub records: Vec<Value>,

    /// Position of the following page, if there is one.
    pub next: Option<PageToken>,
}

impl NormalizedPage {
    /// Normalizes a raw page returned for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MalformedPage`] for scalar pages and for
    /// envelopes whose `data` member is neither an array nor an object.
    pub fn from_value(value: Value, request: &PageRequest) -> Result<Self, SourceError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Array(records) => Ok(Self {
                records,
                next: None,
            }),
            Value::Object(mut obj) => {
                let Some(data) = obj.remove("data") else {
                    // A bare record is a terminal one-record page
                    return Ok(Self {
                        records: vec![Value::Object(obj)],
                        next: None,
                    });
                };

                let records = match data {
                    Value::Array(records) => records,
                    Value::Null => Vec::new(),
                    record @ Value::Object(_) => vec![record],
                    other => {
                        return Err(SourceError::MalformedPage {
                            message: format!("envelope 'data' must be a list, got {}", kind(&other)),
                        });
                    }
                };

                let indicator = obj
                    .get("links")
                    .and_then(|links| links.get("next"))
                    .filter(|v| !v.is_null())
                    .or_else(|| {
                        NEXT_KEYS
                            .iter()
                            .filter_map(|key| obj.get(*key))
                            .find(|v| !v.is_null())
                    });

                let next = indicator.and_then(|v| next_token(v, request, records.len()));

                Ok(Self { records, next })
            }
            other => Err(SourceError::MalformedPage {
                message: format!("expected a list, envelope or record, got {}", kind(&other)),
            }),
        }
    }

    /// Returns true when no further page follows.
    pub fn is_terminal(&self) -> bool {
        self.next.is_none()
    }
}

/// Interprets a next-page indicator.
fn next_token(indicator: &Value, request: &PageRequest, received: usize) -> Option<PageToken> {
    match indicator {
        Value::String(s) if !s.trim().is_empty() => Some(PageToken::Cursor(s.clone())),
        Value::Number(n) => n.as_u64().map(PageToken::Offset),
        Value::Bool(true) if received > 0 => Some(PageToken::Offset(
            request.start_offset() + received as u64,
        )),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
