//! Schema override normalization: remote content type id → local type name.

use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use contentgraph_shared::{ContentType, SchemaOverridesConfig};

/// Local type assigned to one content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeOverride {
    pub def_name: String,
}

/// Normalized overrides. Built once per run, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaOverrides {
    pub document_types: BTreeMap<String, TypeOverride>,
    pub nested_types: BTreeMap<String, TypeOverride>,
}

impl SchemaOverrides {
    /// Classify every fetched content type.
    ///
    /// Content types named in `nested_types` become nested types. Every other
    /// content type becomes a document type, named by `document_types` or by
    /// the PascalCase form of its id.
    pub fn normalize(content_types: &[ContentType], input: &SchemaOverridesConfig) -> Self {
        let mut normalized = Self::default();

        for ct in content_types {
            let id = ct.id();
            if let Some(name) = input.nested_types.get(id) {
                normalized.nested_types.insert(
                    id.to_string(),
                    TypeOverride {
                        def_name: name.clone(),
                    },
                );
            } else {
                let def_name = input
                    .document_types
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| pascal_case(id));
                normalized
                    .document_types
                    .insert(id.to_string(), TypeOverride { def_name });
            }
        }

        let known: HashSet<&str> = content_types.iter().map(ContentType::id).collect();
        for id in input.document_types.keys().chain(input.nested_types.keys()) {
            if !known.contains(id.as_str()) {
                warn!(content_type = %id, "schema override names an unknown content type");
            }
        }

        normalized
    }

    /// Local document type name for a content type.
    pub fn document_type_name(&self, content_type_id: &str) -> Option<&str> {
        self.document_types
            .get(content_type_id)
            .map(|o| o.def_name.as_str())
    }

    /// Local nested type name for a content type.
    pub fn nested_type_name(&self, content_type_id: &str) -> Option<&str> {
        self.nested_types
            .get(content_type_id)
            .map(|o| o.def_name.as_str())
    }
}

/// `blogPost` / `blog-post` / `blog_post` → `BlogPost`.
pub fn pascal_case(id: &str) -> String {
    id.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
