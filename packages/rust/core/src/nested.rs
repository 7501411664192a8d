//! Nested document materialization.

use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use serde_json::{Map, Value};
use tracing::debug;

use contentgraph_schema::FieldDef;
use contentgraph_shared::{ContentGraphError, NestedDocument, Result};

use crate::context::{FieldSource, MaterializeContext, Owner};
use crate::field::resolve_field;

/// Type name stamped on inline list items.
///
/// Inline objects have no content type, so this name is fixed rather than
/// looked up. The leading underscores keep it out of the namespace of
/// declared nested types.
pub const INLINE_TYPE_NAME: &str = "__InlineObject";

/// Deepest chain of nested links followed before giving up.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Resolve every field of `defs` from `source` concurrently, keyed by name.
///
/// Absent values are left out of the map. Failures are tagged with the
/// field name.
pub async fn resolve_fields(
    ctx: &MaterializeContext,
    source: FieldSource<'_>,
    defs: &[FieldDef],
    owner: Owner<'_>,
) -> Result<Map<String, Value>> {
    let resolved =
        try_join_all(defs.iter().map(|def| resolve_named(ctx, source, def, owner))).await?;

    Ok(resolved
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
        .collect())
}

async fn resolve_named<'a>(
    ctx: &MaterializeContext,
    source: FieldSource<'_>,
    def: &'a FieldDef,
    owner: Owner<'_>,
) -> Result<(&'a str, Option<Value>)> {
    let raw = source.value(&def.name, &ctx.options.locale);
    resolve_field(ctx, def, raw, owner)
        .await
        .map(|value| (def.name.as_str(), value))
        .map_err(|e| e.in_field(&def.name))
}

/// Build a nested document from the fetched entry `entry_id`.
///
/// A missing entry is fatal: without it the nested object has no identity.
pub fn materialize_nested<'a>(
    ctx: &'a MaterializeContext,
    entry_id: &'a str,
    defs: &'a [FieldDef],
    type_name: &'a str,
    depth: usize,
) -> BoxFuture<'a, Result<NestedDocument>> {
    async move {
        let entry = ctx
            .index
            .entry(entry_id)
            .ok_or_else(|| ContentGraphError::DanglingEntry {
                id: entry_id.to_string(),
            })?;

        debug!(entry_id, type_name, depth, "materializing nested entry");
        build(ctx, FieldSource::Entry(entry), entry_id, defs, type_name, depth).await
    }
    .boxed()
}

/// Build a nested document from an inline list item under [`INLINE_TYPE_NAME`].
pub fn materialize_inline<'a>(
    ctx: &'a MaterializeContext,
    item: &'a Map<String, Value>,
    defs: &'a [FieldDef],
    parent_id: &'a str,
    depth: usize,
) -> BoxFuture<'a, Result<NestedDocument>> {
    async move {
        build(
            ctx,
            FieldSource::Inline(item),
            parent_id,
            defs,
            INLINE_TYPE_NAME,
            depth,
        )
        .await
    }
    .boxed()
}

async fn build(
    ctx: &MaterializeContext,
    source: FieldSource<'_>,
    entry_id: &str,
    defs: &[FieldDef],
    type_name: &str,
    depth: usize,
) -> Result<NestedDocument> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ContentGraphError::NestingTooDeep {
            id: entry_id.to_string(),
            max: MAX_NESTING_DEPTH,
        });
    }

    let owner = Owner {
        entry_id,
        type_name,
        depth,
    };
    let mut fields = resolve_fields(ctx, source, defs, owner).await?;
    fields.insert(
        ctx.options.type_field.clone(),
        Value::String(type_name.to_string()),
    );

    Ok(NestedDocument {
        raw: source.passthrough(),
        fields,
    })
}
