//! Core domain types: raw records as fetched from the content backend, and
//! the resolved documents produced from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Locale code → raw value for a single field.
pub type LocalizedValue = BTreeMap<String, Value>;

// ---------------------------------------------------------------------------
// Sys / links
// ---------------------------------------------------------------------------

/// System metadata block carried by every remote record and every link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sys {
    /// Stable record identifier.
    pub id: String,
    /// Record kind (`Entry`, `Asset`, `ContentType`, `Link`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Target kind when this block describes a link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    /// Content type link (entries only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<Box<Link>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
    /// Everything else the backend sends (space, environment, locale...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A `{ "sys": { ... } }` link object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub sys: Sys,
}

/// What a link value points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget<'a> {
    Entry(&'a str),
    Asset(&'a str),
}

impl<'a> LinkTarget<'a> {
    /// Inspect a raw field value and classify it as a link, if it is one.
    ///
    /// A link is an object with a `sys` block holding a string `id` and a
    /// `linkType` (or, for already-expanded records, a `type`) of `Entry` or
    /// `Asset`.
    pub fn detect(value: &'a Value) -> Option<Self> {
        let sys = value.get("sys")?.as_object()?;
        let id = sys.get("id")?.as_str()?;
        let marker = sys
            .get("linkType")
            .or_else(|| sys.get("type"))
            .and_then(Value::as_str)?;
        match marker {
            "Entry" => Some(Self::Entry(id)),
            "Asset" => Some(Self::Asset(id)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// One content record exactly as fetched (all locales).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    pub sys: Sys,
    /// Field name → locale → raw value.
    #[serde(default)]
    pub fields: BTreeMap<String, LocalizedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl RawEntry {
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// Content type identifier, if the backend sent one.
    pub fn content_type_id(&self) -> Option<&str> {
        self.sys.content_type.as_ref().map(|ct| ct.sys.id.as_str())
    }

    /// Raw value of `field` in `locale`. JSON `null` counts as absent.
    pub fn field(&self, field: &str, locale: &str) -> Option<&Value> {
        self.fields
            .get(field)
            .and_then(|by_locale| by_locale.get(locale))
            .filter(|v| !v.is_null())
    }

    /// The `_raw` block copied onto every document built from this entry.
    pub fn passthrough(&self) -> Value {
        let mut raw = Map::new();
        raw.insert(
            "sys".into(),
            serde_json::to_value(&self.sys).unwrap_or(Value::Null),
        );
        if let Some(metadata) = &self.metadata {
            raw.insert("metadata".into(), metadata.clone());
        }
        Value::Object(raw)
    }
}

/// One media record exactly as fetched (all locales).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAsset {
    pub sys: Sys,
    #[serde(default)]
    pub fields: BTreeMap<String, LocalizedValue>,
}

impl RawAsset {
    pub fn id(&self) -> &str {
        &self.sys.id
    }

    /// File URL for `locale` as stored upstream (may be protocol-relative).
    pub fn file_url(&self, locale: &str) -> Option<&str> {
        self.fields
            .get("file")?
            .get(locale)?
            .get("url")?
            .as_str()
    }
}

/// Content type metadata, used only to normalize schema overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentType {
    pub sys: Sys,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentType {
    pub fn id(&self) -> &str {
        &self.sys.id
    }
}

// ---------------------------------------------------------------------------
// Resolved output
// ---------------------------------------------------------------------------

/// A fully resolved top-level document.
///
/// `fields` holds the resolved declared fields plus the type discriminator
/// (whose key is configurable, so it is stored alongside the data fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_raw")]
    pub raw: Value,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Value of the type discriminator stored under `type_field`.
    pub fn type_name(&self, type_field: &str) -> Option<&str> {
        self.fields.get(type_field).and_then(Value::as_str)
    }
}

/// A fully resolved embedded object. Same shape as [`Document`] without `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedDocument {
    #[serde(rename = "_raw", default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// One cache slot: a document and the digest of its resolved content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheItem {
    pub document: Document,
    pub document_hash: String,
}

/// Document identifier → cache item.
pub type Cache = BTreeMap<String, CacheItem>;

/// A non-fatal data problem noticed during materialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Entry the problem was found in (top-level or nested).
    pub entry_id: String,
    /// Type being materialized.
    pub type_name: String,
    pub field: String,
    pub message: String,
}
