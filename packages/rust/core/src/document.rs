//! Top-level document materialization.

use serde_json::Value;
use tracing::{debug, instrument};

use contentgraph_schema::DocumentTypeDef;
use contentgraph_shared::{CacheItem, Document, RawEntry, Result};

use crate::context::{FieldSource, MaterializeContext, Owner};
use crate::hash::content_hash;
use crate::nested::resolve_fields;

/// Materialize `entry` as a document of type `def` and hash the result.
///
/// The hash covers the fully resolved document rather than upstream
/// timestamps: a change in a linked child never touches the parent's
/// `updatedAt`. Any failure is tagged with the entry id.
#[instrument(skip_all, fields(entry_id = %entry.id(), type_name = %def.name))]
pub async fn materialize_document(
    ctx: &MaterializeContext,
    entry: &RawEntry,
    def: &DocumentTypeDef,
) -> Result<CacheItem> {
    build(ctx, entry, def)
        .await
        .map_err(|e| e.in_document(entry.id()))
}

async fn build(ctx: &MaterializeContext, entry: &RawEntry, def: &DocumentTypeDef) -> Result<CacheItem> {
    let owner = Owner {
        entry_id: entry.id(),
        type_name: &def.name,
        depth: 0,
    };

    let mut fields = resolve_fields(ctx, FieldSource::Entry(entry), &def.fields, owner).await?;
    fields.insert(
        ctx.options.type_field.clone(),
        Value::String(def.name.clone()),
    );

    let document = Document {
        id: entry.id().to_string(),
        raw: entry.passthrough(),
        fields,
    };
    let document_hash = content_hash(&document)?;

    debug!(hash = %document_hash, "materialized document");

    Ok(CacheItem {
        document,
        document_hash,
    })
}
