//! Logical property names and their provider-side field names.
//!
//! Different catalog services expose the same metadata under different
//! names. Every builder call resolves the caller's logical property through
//! a [`PropertyMapping`] before it goes into the tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Logical name that means "search all free text".
pub const ANY_TEXT: &str = "anyText";
/// Logical name that means "the record's default geometry".
pub const ANY_GEO: &str = "anyGeo";
/// Logical name of the record identifier.
pub const ID: &str = "id";
/// Logical name of the record content type.
pub const CONTENT_TYPE: &str = "contentType";
/// Logical names of the record dates.
pub const EFFECTIVE: &str = "effective";
pub const CREATED: &str = "created";
pub const MODIFIED: &str = "modified";

/// Table resolving logical property names to provider field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyMapping {
    pub any_text_sentinel: String,
    pub free_text_field: String,
    pub any_geo_sentinel: String,
    pub geometry_field: String,
    pub identifier_field: String,
    pub content_type_field: String,
    pub effective_date_field: String,
    pub created_date_field: String,
    pub modified_date_field: String,
    /// Extra logical-to-provider overrides, consulted after the fixed aliases.
    pub fields: BTreeMap<String, String>,
}

impl Default for PropertyMapping {
    fn default() -> Self {
        Self {
            any_text_sentinel: ANY_TEXT.to_string(),
            free_text_field: "AnyText".to_string(),
            any_geo_sentinel: ANY_GEO.to_string(),
            geometry_field: "BBOX".to_string(),
            identifier_field: ID.to_string(),
            content_type_field: "type".to_string(),
            effective_date_field: EFFECTIVE.to_string(),
            created_date_field: CREATED.to_string(),
            modified_date_field: MODIFIED.to_string(),
            fields: BTreeMap::new(),
        }
    }
}

impl PropertyMapping {
    /// Add a logical-to-provider override.
    pub fn with_field(mut self, logical: impl Into<String>, field: impl Into<String>) -> Self {
        self.fields.insert(logical.into(), field.into());
        self
    }

    /// Resolve a logical property name.
    ///
    /// Unmapped names resolve to themselves.
    pub fn resolve(&self, logical: &str) -> PropertyRef {
        let field = if logical == self.any_text_sentinel {
            self.free_text_field.clone()
        } else if logical == self.any_geo_sentinel {
            self.geometry_field.clone()
        } else {
            match logical {
                ID => self.identifier_field.clone(),
                CONTENT_TYPE => self.content_type_field.clone(),
                EFFECTIVE => self.effective_date_field.clone(),
                CREATED => self.created_date_field.clone(),
                MODIFIED => self.modified_date_field.clone(),
                _ => self
                    .fields
                    .get(logical)
                    .cloned()
                    .unwrap_or_else(|| logical.to_string()),
            }
        };

        PropertyRef {
            is_identifier: field == self.identifier_field,
            logical: logical.to_string(),
            field,
        }
    }
}

/// A resolved property: the caller's name and the provider field it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRef {
    pub logical: String,
    pub field: String,
    /// True when `field` is the provider's record-identifier field.
    pub is_identifier: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_text_uses_free_text_field() {
        let mapping = PropertyMapping::default();
        let prop = mapping.resolve("anyText");
        assert_eq!(prop.field, "AnyText");
        assert!(!prop.is_identifier);
    }

    #[test]
    fn fixed_aliases() {
        let mapping = PropertyMapping {
            identifier_field: "identifier".into(),
            content_type_field: "format".into(),
            modified_date_field: "dateModified".into(),
            ..PropertyMapping::default()
        };
        assert_eq!(mapping.resolve("id").field, "identifier");
        assert!(mapping.resolve("id").is_identifier);
        assert_eq!(mapping.resolve("contentType").field, "format");
        assert_eq!(mapping.resolve("modified").field, "dateModified");
        assert_eq!(mapping.resolve("anyGeo").field, "BBOX");
    }

    #[test]
    fn overrides_then_passthrough() {
        let mapping = PropertyMapping::default().with_field("title", "dc:title");
        assert_eq!(mapping.resolve("title").field, "dc:title");
        assert_eq!(mapping.resolve("subject").field, "subject");
        assert_eq!(mapping.resolve("subject").logical, "subject");
    }

    #[test]
    fn provider_identifier_name_is_flagged() {
        let mapping = PropertyMapping {
            identifier_field: "identifier".into(),
            ..PropertyMapping::default()
        };
        assert!(mapping.resolve("identifier").is_identifier);
    }

    #[test]
    fn deserializes_partial_config() {
        let mapping: PropertyMapping =
            serde_json::from_str(r#"{"freeTextField": "csw:AnyText", "fields": {"title": "dc:title"}}"#)
                .unwrap();
        assert_eq!(mapping.free_text_field, "csw:AnyText");
        assert_eq!(mapping.identifier_field, "id");
        assert_eq!(mapping.fields["title"], "dc:title");
    }
}
