//! Field definitions.

use serde::{Deserialize, Serialize};

/// One declared field of a document or nested type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            required: false,
            kind,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Closed set of field kinds, tagged by `type` in schema files.
///
/// Resolvers match on this exhaustively; a new variant does not build until
/// every resolver handles it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Json,
    Enum {
        #[serde(default)]
        options: Vec<String>,
    },
    Date,
    Markdown,
    /// MDX-style rich text, compiled by an external bundler.
    Mdx,
    Reference {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        document_type: Option<String>,
    },
    Nested {
        nested_type: String,
    },
    /// Inline object without a declared type name. Only meaningful as a list element.
    NestedUnnamed {
        fields: Vec<FieldDef>,
    },
    List {
        of: Box<FieldKind>,
    },
    ListPolymorphic {
        of: Vec<FieldKind>,
    },
    ReferencePolymorphic {
        #[serde(default)]
        document_types: Vec<String>,
    },
    NestedPolymorphic {
        #[serde(default)]
        nested_types: Vec<String>,
    },
}

impl FieldKind {
    /// Schema-file tag of this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Json => "json",
            Self::Enum { .. } => "enum",
            Self::Date => "date",
            Self::Markdown => "markdown",
            Self::Mdx => "mdx",
            Self::Reference { .. } => "reference",
            Self::Nested { .. } => "nested",
            Self::NestedUnnamed { .. } => "nested-unnamed",
            Self::List { .. } => "list",
            Self::ListPolymorphic { .. } => "list-polymorphic",
            Self::ReferencePolymorphic { .. } => "reference-polymorphic",
            Self::NestedPolymorphic { .. } => "nested-polymorphic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_fields_from_toml() {
        let toml_str = r#"
[[fields]]
name = "title"
type = "string"
required = true

[[fields]]
name = "blocks"
type = "list"
of = { type = "nested-unnamed", fields = [{ name = "caption", type = "string" }] }

[[fields]]
name = "sections"
type = "list-polymorphic"
of = [{ type = "nested", nested_type = "Hero" }, { type = "nested", nested_type = "Quote" }]
"#;
        #[derive(Deserialize)]
        struct Wrapper {
            fields: Vec<FieldDef>,
        }
        let parsed: Wrapper = toml::from_str(toml_str).expect("parse");
        assert_eq!(parsed.fields[0], FieldDef::new("title", FieldKind::String).required());
        match &parsed.fields[1].kind {
            FieldKind::List { of } => match of.as_ref() {
                FieldKind::NestedUnnamed { fields } => assert_eq!(fields[0].name, "caption"),
                other => panic!("unexpected element kind {other:?}"),
            },
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(parsed.fields[2].kind.tag(), "list-polymorphic");
    }

    #[test]
    fn parses_from_json() {
        let def: FieldDef = serde_json::from_str(
            r#"{ "name": "author", "type": "nested", "nested_type": "Person" }"#,
        )
        .unwrap();
        assert!(!def.required);
        assert_eq!(
            def.kind,
            FieldKind::Nested {
                nested_type: "Person".into()
            }
        );
    }
}
