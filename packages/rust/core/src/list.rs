//! Per-item resolution for list fields.

use serde_json::Value;

use contentgraph_schema::{FieldDef, FieldKind};
use contentgraph_shared::{ContentGraphError, LinkTarget, Result};

use crate::context::{MaterializeContext, Owner};
use crate::field::{asset_url, to_value};
use crate::nested::{materialize_inline, materialize_nested};

/// Declared element kind(s) of the enclosing list field.
#[derive(Debug, Clone, Copy)]
pub enum ListElement<'a> {
    Homogeneous(&'a FieldKind),
    Polymorphic(&'a [FieldKind]),
}

impl<'a> ListElement<'a> {
    /// Every declared element is a reference, so linked entries stay ids.
    fn holds_references(self) -> bool {
        let is_reference = |kind: &FieldKind| {
            matches!(
                kind,
                FieldKind::Reference { .. } | FieldKind::ReferencePolymorphic { .. }
            )
        };
        match self {
            Self::Homogeneous(kind) => is_reference(kind),
            Self::Polymorphic(kinds) => !kinds.is_empty() && kinds.iter().all(is_reference),
        }
    }

    /// Field defs for inline objects, when the list declares them.
    fn inline_fields(self) -> Option<&'a [FieldDef]> {
        match self {
            Self::Homogeneous(FieldKind::NestedUnnamed { fields }) => Some(fields.as_slice()),
            _ => None,
        }
    }
}

/// Resolve one raw list item.
///
/// - plain strings pass through;
/// - entry links become nested documents, typed through the schema
///   overrides by the linked entry's content type (or stay ids in
///   reference lists);
/// - asset links become absolute URLs;
/// - bare objects become inline nested documents when the list declares
///   `nested-unnamed` elements.
///
/// Anything else is rejected with the offending payload attached.
pub async fn resolve_list_item(
    ctx: &MaterializeContext,
    item: &Value,
    element: ListElement<'_>,
    owner: Owner<'_>,
) -> Result<Value> {
    if item.is_string() {
        return Ok(item.clone());
    }

    match LinkTarget::detect(item) {
        Some(LinkTarget::Entry(id)) => {
            if element.holds_references() {
                return Ok(Value::String(id.to_string()));
            }
            return resolve_linked_entry(ctx, id, owner).await;
        }
        Some(LinkTarget::Asset(id)) => return asset_url(ctx, id).map(Value::String),
        None => {}
    }

    match (item.as_object(), element.inline_fields()) {
        (Some(object), Some(fields)) => {
            let nested =
                materialize_inline(ctx, object, fields, owner.entry_id, owner.depth + 1).await?;
            to_value(&nested)
        }
        _ => Err(ContentGraphError::UnhandledListItem {
            payload: item.clone(),
        }),
    }
}

async fn resolve_linked_entry(
    ctx: &MaterializeContext,
    id: &str,
    owner: Owner<'_>,
) -> Result<Value> {
    let entry = ctx
        .index
        .entry(id)
        .ok_or_else(|| ContentGraphError::DanglingEntry { id: id.to_string() })?;

    let content_type = entry
        .content_type_id()
        .ok_or_else(|| ContentGraphError::parse(format!("entry '{id}' has no content type")))?;

    let type_name = ctx
        .overrides
        .nested_type_name(content_type)
        .ok_or_else(|| ContentGraphError::UnknownType {
            kind: "nested content type",
            name: content_type.to_string(),
        })?;

    let nested_def = ctx.schema.nested_type(type_name)?;
    let nested = materialize_nested(
        ctx,
        id,
        &nested_def.fields,
        &nested_def.name,
        owner.depth + 1,
    )
    .await?;

    to_value(&nested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::*;
    use crate::field::resolve_field;
    use crate::nested::INLINE_TYPE_NAME;
    use contentgraph_schema::{NestedTypeDef, SchemaDef, SchemaOverrides, TypeOverride};
    use serde_json::json;

    fn blocks_schema() -> (SchemaDef, SchemaOverrides) {
        let schema = SchemaDef {
            document_types: vec![],
            nested_types: vec![
                NestedTypeDef {
                    name: "Hero".into(),
                    fields: vec![FieldDef::new("heading", FieldKind::String)],
                },
                NestedTypeDef {
                    name: "Quote".into(),
                    fields: vec![FieldDef::new("text", FieldKind::String)],
                },
            ],
        };
        let mut overrides = SchemaOverrides::default();
        for (ct, name) in [("hero", "Hero"), ("quote", "Quote")] {
            overrides.nested_types.insert(
                ct.into(),
                TypeOverride {
                    def_name: name.into(),
                },
            );
        }
        (schema, overrides)
    }

    fn polymorphic() -> FieldKind {
        FieldKind::ListPolymorphic {
            of: vec![
                FieldKind::Nested {
                    nested_type: "Hero".into(),
                },
                FieldKind::Nested {
                    nested_type: "Quote".into(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn polymorphic_list_preserves_order() {
        let (schema, overrides) = blocks_schema();
        let entries = vec![
            entry("h1", "hero", json!({ "heading": "one" })),
            entry("q1", "quote", json!({ "text": "two" })),
            entry("h2", "hero", json!({ "heading": "three" })),
            entry("q2", "quote", json!({ "text": "four" })),
            entry("h3", "hero", json!({ "heading": "five" })),
        ];
        let ctx = context(entries, vec![], schema, overrides);
        let raw = json!(["h1", "q1", "h2", "q2", "h3"]
            .iter()
            .map(|id| entry_link(id))
            .collect::<Vec<_>>());

        let def = FieldDef::new("blocks", polymorphic());
        let value = resolve_field(&ctx, &def, Some(&raw), owner())
            .await
            .unwrap()
            .unwrap();
        let items = value.as_array().unwrap();

        assert_eq!(items.len(), 5);
        let types: Vec<&str> = items.iter().map(|i| i["type"].as_str().unwrap()).collect();
        assert_eq!(types, vec!["Hero", "Quote", "Hero", "Quote", "Hero"]);
        assert_eq!(items[0]["heading"], "one");
        assert_eq!(items[1]["text"], "two");
        assert_eq!(items[4]["heading"], "five");
    }

    #[tokio::test]
    async fn plain_strings_pass_through() {
        let ctx = context(vec![], vec![], SchemaDef::default(), SchemaOverrides::default());
        let kind = FieldKind::String;
        let value = resolve_list_item(&ctx, &json!("tag"), ListElement::Homogeneous(&kind), owner())
            .await
            .unwrap();
        assert_eq!(value, json!("tag"));
    }

    #[tokio::test]
    async fn reference_lists_keep_ids() {
        let ctx = context(vec![], vec![], SchemaDef::default(), SchemaOverrides::default());
        let kind = FieldKind::Reference {
            document_type: None,
        };
        let value = resolve_list_item(
            &ctx,
            &entry_link("elsewhere"),
            ListElement::Homogeneous(&kind),
            owner(),
        )
        .await
        .unwrap();
        assert_eq!(value, json!("elsewhere"));
    }

    #[tokio::test]
    async fn asset_links_become_urls() {
        let ctx = context(
            vec![],
            vec![asset("img", "//cdn.example/a.png")],
            SchemaDef::default(),
            SchemaOverrides::default(),
        );
        let kind = FieldKind::String;
        let value = resolve_list_item(&ctx, &asset_link("img"), ListElement::Homogeneous(&kind), owner())
            .await
            .unwrap();
        assert_eq!(value, json!("https://cdn.example/a.png"));
    }

    #[tokio::test]
    async fn inline_objects_need_nested_unnamed_elements() {
        let ctx = context(vec![], vec![], SchemaDef::default(), SchemaOverrides::default());
        let inline = FieldKind::NestedUnnamed {
            fields: vec![FieldDef::new("label", FieldKind::String)],
        };
        let item = json!({ "label": "Docs" });

        let value = resolve_list_item(&ctx, &item, ListElement::Homogeneous(&inline), owner())
            .await
            .unwrap();
        assert_eq!(value["label"], "Docs");
        assert_eq!(value["type"], INLINE_TYPE_NAME);

        let kinds = [inline.clone()];
        let err = resolve_list_item(&ctx, &item, ListElement::Polymorphic(&kinds), owner())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentGraphError::UnhandledListItem { payload } if payload == item));
    }

    #[tokio::test]
    async fn unknown_shapes_carry_payload() {
        let ctx = context(vec![], vec![], SchemaDef::default(), SchemaOverrides::default());
        let kind = FieldKind::String;
        let err = resolve_list_item(&ctx, &json!(42), ListElement::Homogeneous(&kind), owner())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("42"));
    }

    #[tokio::test]
    async fn linked_entry_without_nested_override_is_unknown() {
        let (schema, _) = blocks_schema();
        let ctx = context(
            vec![entry("h1", "hero", json!({}))],
            vec![],
            schema,
            SchemaOverrides::default(),
        );
        let err = resolve_list_item(&ctx, &entry_link("h1"), ListElement::Polymorphic(&[]), owner())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentGraphError::UnknownType { .. }));
    }

    #[tokio::test]
    async fn one_failing_item_fails_the_field() {
        let (schema, overrides) = blocks_schema();
        let ctx = context(
            vec![entry("h1", "hero", json!({ "heading": "ok" }))],
            vec![],
            schema,
            overrides,
        );
        let raw = json!([entry_link("h1"), entry_link("missing")]);
        let def = FieldDef::new("blocks", polymorphic());
        let err = resolve_field(&ctx, &def, Some(&raw), owner())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentGraphError::DanglingEntry { .. }));
    }
}
