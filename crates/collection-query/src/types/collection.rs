//! Collection types.
//!
//! A [`CollectionType`] identifies one remote record family. The set is closed
//! and known at build time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A remote record family that can be searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionType {
    /// Product features and subfeatures.
    Features,
    /// Customer notes (insights).
    Notes,
    /// Customer companies.
    Companies,
    /// Customer users.
    Users,
    /// Products at the top of the hierarchy.
    Products,
    /// Components grouping features.
    Components,
    /// Releases.
    Releases,
    /// Objectives.
    Objectives,
    /// Initiatives.
    Initiatives,
    /// Custom field definitions.
    CustomFields,
    /// Webhook subscriptions.
    Webhooks,
    /// Plugin integrations.
    Integrations,
}

impl CollectionType {
    /// Every collection type, in declaration order.
    pub const ALL: [CollectionType; 12] = [
        CollectionType::Features,
        CollectionType::Notes,
        CollectionType::Companies,
        CollectionType::Users,
        CollectionType::Products,
        CollectionType::Components,
        CollectionType::Releases,
        CollectionType::Objectives,
        CollectionType::Initiatives,
        CollectionType::CustomFields,
        CollectionType::Webhooks,
        CollectionType::Integrations,
    ];

    /// Returns the wire name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionType::Features => "features",
            CollectionType::Notes => "notes",
            CollectionType::Companies => "companies",
            CollectionType::Users => "users",
            CollectionType::Products => "products",
            CollectionType::Components => "components",
            CollectionType::Releases => "releases",
            CollectionType::Objectives => "objectives",
            CollectionType::Initiatives => "initiatives",
            CollectionType::CustomFields => "custom-fields",
            CollectionType::Webhooks => "webhooks",
            CollectionType::Integrations => "integrations",
        }
    }

    /// Returns a comma-separated list of all valid type names.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == name)
            .ok_or_else(|| format!("unknown collection type: {}", s))
    }
}

/// Formats a list of types as a comma-separated string.
pub(crate) fn join_types(types: &[CollectionType]) -> String {
    types
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_type_round_trip_names() {
        for t in CollectionType::ALL {
            assert_eq!(t.as_str().parse::<CollectionType>().unwrap(), t);
        }
    }

    #[test]
    fn test_collection_type_parse_unknown() {
        assert!("feature".parse::<CollectionType>().is_err());
        assert!("".parse::<CollectionType>().is_err());
    }

    #[test]
    fn test_collection_type_serde_kebab_case() {
        let json = serde_json::to_string(&CollectionType::CustomFields).unwrap();
        assert_eq!(json, "\"custom-fields\"");
        let parsed: CollectionType = serde_json::from_str("\"custom-fields\"").unwrap();
        assert_eq!(parsed, CollectionType::CustomFields);
    }

    #[test]
    fn test_valid_names_lists_everything() {
        let names = CollectionType::valid_names();
        assert!(names.starts_with("features, notes"));
        assert!(names.ends_with("integrations"));
    }
}
