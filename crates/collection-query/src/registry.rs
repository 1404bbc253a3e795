//! Field mapping and list-source registry.
//!
//! The registry is the single source of per-type behavior: which fields a
//! collection exposes for searching and output, which filters its list
//! operation can apply itself, and the [`PagedListSource`] used to fetch it.
//!
//! Field tables are static configuration and never change at runtime. Sources
//! are attached once when the registry is built.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SourceError;
use crate::path;
use crate::types::{CollectionType, ORIGIN_TYPE_FIELD, PageRequest};

/// An external paged "list" operation for one collection type.
///
/// Implementations return one page per call, shaped as a bare array, an
/// envelope `{data, links.next | next | nextCursor | pageCursor}`, or a single
/// bare record. Timeouts and retries are the implementation's concern.
#[async_trait]
pub trait PagedListSource: Send + Sync {
    /// Fetches one page.
    async fn list_page(&self, request: PageRequest) -> Result<Value, SourceError>;
}

/// Shared handle to a list source.
pub type DynListSource = Arc<dyn PagedListSource>;

/// Static field metadata for one collection type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    /// Dot-paths that may be filtered on.
    pub searchable_fields: Vec<&'static str>,

    /// Subset of `searchable_fields` the list operation can filter on itself.
    pub server_side_fields: Vec<&'static str>,

    /// Upstream query parameter names, keyed by filter field.
    pub filter_param_aliases: Vec<(&'static str, &'static str)>,

    /// Curated summary projection, starting with id and display name.
    pub summary_fields: Vec<&'static str>,

    /// Fields that can be projected but not searched.
    pub output_only_fields: Vec<&'static str>,

    /// Nested sub-data dropped from full output when sub-data is excluded.
    pub sub_data_fields: Vec<&'static str>,
}

/// Timestamp fields added to summaries at full detail.
pub const TIMESTAMP_FIELDS: &[&str] = &["createdAt", "updatedAt"];

impl FieldMapping {
    /// Returns the built-in mapping for a collection type.
    pub fn builtin(collection_type: CollectionType) -> Self {
        match collection_type {
            CollectionType::Features => Self {
                searchable_fields: vec![
                    "id",
                    "name",
                    "description",
                    "type",
                    "status.id",
                    "status.name",
                    "parent.id",
                    "parent.feature.id",
                    "parent.component.id",
                    "parent.product.id",
                    "owner.email",
                    "timeframe.startDate",
                    "timeframe.endDate",
                    "archived",
                    "createdAt",
                    "updatedAt",
                ],
                server_side_fields: vec![
                    "status.id",
                    "status.name",
                    "parent.id",
                    "owner.email",
                    "archived",
                ],
                filter_param_aliases: vec![],
                summary_fields: vec!["id", "name", "status.name", "type", "parent"],
                output_only_fields: vec!["links", "timeframe"],
                sub_data_fields: vec!["links"],
            },
            CollectionType::Notes => Self {
                searchable_fields: vec![
                    "id",
                    "title",
                    "content",
                    "state",
                    "tags",
                    "company.id",
                    "company.domain",
                    "user.email",
                    "owner.email",
                    "source.origin",
                    "source.record_id",
                    "displayUrl",
                    "createdAt",
                    "updatedAt",
                ],
                server_side_fields: vec!["company.id", "owner.email", "tags"],
                filter_param_aliases: vec![
                    ("company.id", "companyId"),
                    ("owner.email", "ownerEmail"),
                    ("tags", "allTags"),
                ],
                summary_fields: vec!["id", "title", "state", "company.id", "owner.email"],
                output_only_fields: vec!["links", "followers", "externalDisplayUrl"],
                sub_data_fields: vec!["links", "followers"],
            },
            CollectionType::Companies => Self {
                searchable_fields: vec![
                    "id",
                    "name",
                    "domain",
                    "description",
                    "sourceOrigin",
                    "sourceRecordId",
                ],
                server_side_fields: vec![],
                filter_param_aliases: vec![],
                summary_fields: vec!["id", "name", "domain", "sourceOrigin"],
                output_only_fields: vec!["links", "createdAt", "updatedAt"],
                sub_data_fields: vec!["links"],
            },
            CollectionType::Users => Self {
                searchable_fields: vec!["id", "name", "email", "externalId", "company.id"],
                server_side_fields: vec![],
                filter_param_aliases: vec![],
                summary_fields: vec!["id", "name", "email", "company.id"],
                output_only_fields: vec!["links", "createdAt", "updatedAt"],
                sub_data_fields: vec!["links"],
            },
            CollectionType::Products => Self {
                searchable_fields: vec![
                    "id",
                    "name",
                    "description",
                    "owner.email",
                    "createdAt",
                    "updatedAt",
                ],
                server_side_fields: vec![],
                filter_param_aliases: vec![],
                summary_fields: vec!["id", "name", "owner.email"],
                output_only_fields: vec!["links"],
                sub_data_fields: vec!["links"],
            },
            CollectionType::Components => Self {
                searchable_fields: vec![
                    "id",
                    "name",
                    "description",
                    "parent.product.id",
                    "parent.component.id",
                    "owner.email",
                    "createdAt",
                    "updatedAt",
                ],
                server_side_fields: vec![],
                filter_param_aliases: vec![],
                summary_fields: vec!["id", "name", "parent", "owner.email"],
                output_only_fields: vec!["links"],
                sub_data_fields: vec!["links"],
            },
            CollectionType::Releases => Self {
                searchable_fields: vec![
                    "id",
                    "name",
                    "description",
                    "state",
                    "releaseGroup.id",
                    "timeframe.startDate",
                    "timeframe.endDate",
                    "createdAt",
                    "updatedAt",
                ],
                server_side_fields: vec!["releaseGroup.id"],
                filter_param_aliases: vec![],
                summary_fields: vec!["id", "name", "state", "releaseGroup.id"],
                output_only_fields: vec!["links", "timeframe"],
                sub_data_fields: vec!["links"],
            },
            CollectionType::Objectives => Self {
                searchable_fields: vec![
                    "id",
                    "name",
                    "description",
                    "state",
                    "level",
                    "owner.email",
                    "parent.id",
                    "archived",
                    "timeframe.startDate",
                    "timeframe.endDate",
                    "createdAt",
                    "updatedAt",
                ],
                server_side_fields: vec!["archived", "owner.email", "parent.id", "state"],
                filter_param_aliases: vec![],
                summary_fields: vec!["id", "name", "state", "owner.email"],
                output_only_fields: vec!["links", "timeframe"],
                sub_data_fields: vec!["links"],
            },
            CollectionType::Initiatives => Self {
                searchable_fields: vec![
                    "id",
                    "name",
                    "description",
                    "state",
                    "owner.email",
                    "archived",
                    "timeframe.startDate",
                    "timeframe.endDate",
                    "createdAt",
                    "updatedAt",
                ],
                server_side_fields: vec!["archived", "owner.email", "state"],
                filter_param_aliases: vec![],
                summary_fields: vec!["id", "name", "state", "owner.email"],
                output_only_fields: vec!["links", "timeframe"],
                sub_data_fields: vec!["links"],
            },
            CollectionType::CustomFields => Self {
                searchable_fields: vec!["id", "name", "type", "description"],
                server_side_fields: vec!["type"],
                filter_param_aliases: vec![],
                summary_fields: vec!["id", "name", "type"],
                output_only_fields: vec!["links", "options"],
                sub_data_fields: vec!["links", "options"],
            },
            CollectionType::Webhooks => Self {
                searchable_fields: vec![
                    "id",
                    "name",
                    "events.eventType",
                    "notification.url",
                    "createdAt",
                ],
                server_side_fields: vec![],
                filter_param_aliases: vec![],
                summary_fields: vec!["id", "name", "events", "notification.url"],
                output_only_fields: vec!["links", "notification.headers"],
                sub_data_fields: vec!["links", "notification.headers"],
            },
            CollectionType::Integrations => Self {
                searchable_fields: vec![
                    "id",
                    "type",
                    "integrationStatus",
                    "initialState.label",
                    "action.url",
                    "createdAt",
                ],
                server_side_fields: vec![],
                filter_param_aliases: vec![],
                summary_fields: vec!["id", "type", "integrationStatus", "initialState.label"],
                output_only_fields: vec!["links", "action"],
                sub_data_fields: vec!["links"],
            },
        }
    }

    /// Returns true if `field` is searchable: listed verbatim, or a dot-path
    /// prefix of a listed field.
    pub fn is_searchable(&self, field: &str) -> bool {
        self.searchable_fields
            .iter()
            .any(|listed| path::is_prefix(field, listed))
    }

    /// Returns true if the list operation can filter on `field` itself.
    pub fn is_server_side(&self, field: &str) -> bool {
        self.server_side_fields.contains(&field)
    }

    /// Returns the upstream query parameter for a server-side field.
    pub fn server_param<'a>(&'a self, field: &'a str) -> Option<&'a str> {
        if !self.is_server_side(field) {
            return None;
        }
        let param = self
            .filter_param_aliases
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, param)| *param);
        Some(param.unwrap_or(field))
    }

    /// Returns true if `field` may appear in an explicit output list.
    pub fn is_available(&self, field: &str) -> bool {
        field == ORIGIN_TYPE_FIELD
            || self.is_searchable(field)
            || self
                .summary_fields
                .iter()
                .chain(self.output_only_fields.iter())
                .chain(TIMESTAMP_FIELDS.iter())
                .any(|listed| path::is_prefix(field, listed) || path::is_prefix(listed, field))
    }
}

/// A registered collection: its field mapping and its list source.
#[derive(Clone)]
pub struct CollectionEntry {
    /// Field metadata.
    pub mapping: FieldMapping,

    /// List source, if one has been attached.
    pub source: Option<DynListSource>,
}

impl fmt::Debug for CollectionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionEntry")
            .field("mapping", &self.mapping)
            .field("source", &self.source.as_ref().map(|_| "<source>"))
            .finish()
    }
}

/// Registry of every collection type's mapping and list source.
#[derive(Debug, Clone)]
pub struct CollectionRegistry {
    entries: HashMap<CollectionType, CollectionEntry>,
}

impl CollectionRegistry {
    /// Creates a registry with the built-in mappings and no sources.
    pub fn new() -> Self {
        let entries = CollectionType::ALL
            .iter()
            .map(|t| {
                (
                    *t,
                    CollectionEntry {
                        mapping: FieldMapping::builtin(*t),
                        source: None,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Attaches the list source for a collection type.
    pub fn with_source(mut self, collection_type: CollectionType, source: DynListSource) -> Self {
        self.register_source(collection_type, source);
        self
    }

    /// Attaches or replaces the list source for a collection type.
    pub fn register_source(&mut self, collection_type: CollectionType, source: DynListSource) {
        if let Some(entry) = self.entries.get_mut(&collection_type) {
            entry.source = Some(source);
        }
    }

    /// Replaces the field mapping for a collection type.
    pub fn with_mapping(mut self, collection_type: CollectionType, mapping: FieldMapping) -> Self {
        if let Some(entry) = self.entries.get_mut(&collection_type) {
            entry.mapping = mapping;
        }
        self
    }

    /// Returns the mapping for a collection type.
    pub fn mapping(&self, collection_type: CollectionType) -> &FieldMapping {
        // Every variant is inserted by `new` and entries are never removed.
        &self.entries[&collection_type].mapping
    }

    /// Returns the list source for a collection type.
    pub fn source(&self, collection_type: CollectionType) -> Option<DynListSource> {
        self.entries
            .get(&collection_type)
            .and_then(|entry| entry.source.clone())
    }

    /// Returns true if `field` is searchable in `collection_type`.
    pub fn is_searchable(&self, collection_type: CollectionType, field: &str) -> bool {
        self.mapping(collection_type).is_searchable(field)
    }

    /// Returns true if `field` can be projected for `collection_type`.
    pub fn is_available(&self, collection_type: CollectionType, field: &str) -> bool {
        self.mapping(collection_type).is_available(field)
    }

    /// Returns the requested types in which `field` is searchable.
    pub fn searchable_in(&self, types: &[CollectionType], field: &str) -> Vec<CollectionType> {
        types
            .iter()
            .copied()
            .filter(|t| self.is_searchable(*t, field))
            .collect()
    }
}

impl Default for CollectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
