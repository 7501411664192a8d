//! Document and nested type definitions, and schema file loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use contentgraph_shared::{ContentGraphError, Result};

use crate::field::FieldDef;

/// A top-level document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTypeDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// An embedded object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedTypeDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// The full set of type definitions for one run. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    #[serde(default)]
    pub document_types: Vec<DocumentTypeDef>,
    #[serde(default)]
    pub nested_types: Vec<NestedTypeDef>,
}

impl SchemaDef {
    /// Load a schema from a `.toml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ContentGraphError::io(path, e))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let schema: Self = if is_json {
            serde_json::from_str(&content).map_err(|e| {
                ContentGraphError::parse(format!("invalid schema {}: {e}", path.display()))
            })?
        } else {
            toml::from_str(&content).map_err(|e| {
                ContentGraphError::parse(format!("invalid schema {}: {e}", path.display()))
            })?
        };

        tracing::debug!(
            path = %path.display(),
            document_types = schema.document_types.len(),
            nested_types = schema.nested_types.len(),
            "loaded schema"
        );

        Ok(schema)
    }

    pub fn document_type(&self, name: &str) -> Option<&DocumentTypeDef> {
        self.document_types.iter().find(|d| d.name == name)
    }

    /// Look up a nested type, failing with [`ContentGraphError::UnknownType`].
    pub fn nested_type(&self, name: &str) -> Result<&NestedTypeDef> {
        self.nested_types
            .iter()
            .find(|n| n.name == name)
            .ok_or_else(|| ContentGraphError::UnknownType {
                kind: "nested type",
                name: name.to_string(),
            })
    }
}
