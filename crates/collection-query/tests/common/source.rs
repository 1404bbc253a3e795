//! Scripted in-memory list sources.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use collection_query::path;
use collection_query::{PageRequest, PageToken, PagedListSource, SourceError};
use serde_json::{Value, json};

/// How a scripted source pages its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// Envelope with `links.next` cursors.
    Cursor,
    /// Envelope with a numeric `next` offset.
    Offset,
    /// One bare array holding every record.
    Bare,
    /// Cursor pages that never end.
    Endless,
}

/// An in-memory [`PagedListSource`] that records every call.
pub struct ScriptedSource {
    records: Vec<Value>,
    paging: Paging,
    raw: Option<Value>,
    fail_on_call: Option<usize>,
    delay: Option<Duration>,
    param_fields: Vec<(String, String)>,
    calls: Mutex<Vec<PageRequest>>,
}

impl ScriptedSource {
    /// Serves `records` in cursor pages.
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records,
            paging: Paging::Cursor,
            raw: None,
            fail_on_call: None,
            delay: None,
            param_fields: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers every call with the same raw page.
    pub fn raw(page: Value) -> Self {
        Self {
            raw: Some(page),
            ..Self::new(Vec::new())
        }
    }

    /// Never runs out of pages.
    pub fn endless() -> Self {
        Self::new(Vec::new()).with_paging(Paging::Endless)
    }

    /// Sets the paging style.
    pub fn with_paging(mut self, paging: Paging) -> Self {
        self.paging = paging;
        self
    }

    /// Fails the given call (1-based) with an upstream error.
    pub fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Sleeps before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Applies query parameter `param` as an equality filter on `field`.
    pub fn with_param_field(mut self, param: &str, field: &str) -> Self {
        self.param_fields.push((param.to_string(), field.to_string()));
        self
    }

    /// Returns every request received so far.
    pub fn calls(&self) -> Vec<PageRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn matching(&self, request: &PageRequest) -> Vec<Value> {
        self.records
            .iter()
            .filter(|record| {
                request.params.iter().all(|(param, expected)| {
                    let field = self
                        .param_fields
                        .iter()
                        .find(|(p, _)| p == param)
                        .map(|(_, f)| f.as_str())
                        .unwrap_or(param);
                    match path::resolve(record, field) {
                        Some(Value::String(s)) => s == expected,
                        Some(other) => other.to_string() == *expected,
                        None => false,
                    }
                })
            })
            .cloned()
            .collect()
    }
}

fn start_of(request: &PageRequest) -> usize {
    match &request.token {
        Some(PageToken::Cursor(cursor)) => cursor
            .strip_prefix("cursor-")
            .and_then(|n| n.parse().ok())
            .unwrap_or(0),
        Some(PageToken::Offset(offset)) => *offset as usize,
        None => 0,
    }
}

#[async_trait]
impl PagedListSource for ScriptedSource {
    async fn list_page(&self, request: PageRequest) -> Result<Value, SourceError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request.clone());
            calls.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_on_call == Some(call) {
            return Err(SourceError::Upstream {
                status: Some(503),
                message: "service unavailable".to_string(),
            });
        }

        if let Some(raw) = &self.raw {
            return Ok(raw.clone());
        }

        let start = start_of(&request);
        let limit = request.limit as usize;

        if self.paging == Paging::Endless {
            let data: Vec<Value> = (start..start + limit)
                .map(|i| json!({"id": format!("e{}", i), "name": format!("Endless {}", i)}))
                .collect();
            return Ok(json!({"data": data, "links": {"next": format!("cursor-{}", start + limit)}}));
        }

        let records = self.matching(&request);
        if self.paging == Paging::Bare {
            return Ok(Value::Array(records));
        }

        let end = (start + limit).min(records.len());
        let data = records.get(start..end).map(<[Value]>::to_vec).unwrap_or_default();
        let more = end < records.len();

        Ok(match self.paging {
            Paging::Offset => json!({
                "data": data,
                "next": if more { json!(end) } else { Value::Null },
            }),
            _ => json!({
                "data": data,
                "links": {"next": if more { json!(format!("cursor-{}", end)) } else { Value::Null }},
            }),
        })
    }
}
