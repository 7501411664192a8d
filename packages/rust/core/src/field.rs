//! Field value resolution: one declared field + its raw value → typed value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use futures::future::try_join_all;
use serde_json::{Value, json};

use contentgraph_schema::{FieldDef, FieldKind};
use contentgraph_shared::{ContentGraphError, Diagnostic, LinkTarget, Result};

use crate::context::{MaterializeContext, Owner};
use crate::list::{ListElement, resolve_list_item};
use crate::nested::materialize_nested;

/// Resolve one field. `Ok(None)` means the value is absent.
///
/// A missing value is never fatal; a missing *required* value is recorded
/// as a diagnostic.
pub async fn resolve_field(
    ctx: &MaterializeContext,
    def: &FieldDef,
    raw: Option<&Value>,
    owner: Owner<'_>,
) -> Result<Option<Value>> {
    let Some(raw) = raw else {
        if def.required {
            ctx.diagnose(Diagnostic {
                entry_id: owner.entry_id.to_string(),
                type_name: owner.type_name.to_string(),
                field: def.name.clone(),
                message: "required field has no value".into(),
            })
            .await;
        }
        return Ok(None);
    };

    let value = match &def.kind {
        FieldKind::String => resolve_string(ctx, raw)?,
        FieldKind::Number | FieldKind::Boolean | FieldKind::Json | FieldKind::Enum { .. } => {
            raw.clone()
        }
        FieldKind::Date => Value::String(parse_date(raw)?),
        FieldKind::Markdown => {
            let source = expect_str(raw, "markdown")?;
            let html = ctx.renderers.markdown.render(source).await?;
            json!({ "raw": source, "html": html })
        }
        FieldKind::Mdx => {
            let source = expect_str(raw, "mdx")?;
            let code = ctx.renderers.rich_text.bundle(source).await?;
            json!({ "raw": source, "code": code })
        }
        // References stay lazy: consumers resolve the id themselves.
        FieldKind::Reference { .. } => Value::String(link_id(raw)?.to_string()),
        FieldKind::Nested { nested_type } => {
            let nested_def = ctx.schema.nested_type(nested_type)?;
            let nested = materialize_nested(
                ctx,
                link_id(raw)?,
                &nested_def.fields,
                &nested_def.name,
                owner.depth + 1,
            )
            .await?;
            to_value(&nested)?
        }
        FieldKind::List { of } => {
            resolve_list(ctx, raw, ListElement::Homogeneous(of), owner).await?
        }
        FieldKind::ListPolymorphic { of } => {
            resolve_list(ctx, raw, ListElement::Polymorphic(of), owner).await?
        }
        FieldKind::NestedUnnamed { .. }
        | FieldKind::ReferencePolymorphic { .. }
        | FieldKind::NestedPolymorphic { .. } => {
            return Err(ContentGraphError::UnsupportedFieldKind {
                kind: def.kind.tag(),
            });
        }
    };

    Ok(Some(value))
}

/// Resolve all items concurrently. Output order matches input order.
async fn resolve_list(
    ctx: &MaterializeContext,
    raw: &Value,
    element: ListElement<'_>,
    owner: Owner<'_>,
) -> Result<Value> {
    let items = raw
        .as_array()
        .ok_or_else(|| ContentGraphError::parse(format!("expected a list, got {raw}")))?;

    let resolved = try_join_all(
        items
            .iter()
            .map(|item| resolve_list_item(ctx, item, element, owner)),
    )
    .await?;

    Ok(Value::Array(resolved))
}

/// Strings pass through unchanged unless they are asset links, which become
/// the asset's absolute URL.
pub(crate) fn resolve_string(ctx: &MaterializeContext, raw: &Value) -> Result<Value> {
    match LinkTarget::detect(raw) {
        Some(LinkTarget::Asset(id)) => asset_url(ctx, id).map(Value::String),
        _ => Ok(raw.clone()),
    }
}

/// Absolute file URL of asset `id`. A dangling asset id is fatal.
pub(crate) fn asset_url(ctx: &MaterializeContext, id: &str) -> Result<String> {
    let url = ctx
        .index
        .asset(id)
        .and_then(|asset| asset.file_url(&ctx.options.locale))
        .ok_or_else(|| ContentGraphError::DanglingAsset { id: id.to_string() })?;

    Ok(absolute_url(url))
}

/// Normalize a protocol-relative URL (`//host/path`) to `https:`.
pub fn absolute_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}

/// Target id of a link value (or a bare id string).
pub(crate) fn link_id(raw: &Value) -> Result<&str> {
    if let Some(id) = raw.as_str() {
        return Ok(id);
    }
    raw.get("sys")
        .and_then(|sys| sys.get("id"))
        .and_then(Value::as_str)
        .ok_or_else(|| ContentGraphError::parse(format!("expected a link, got {raw}")))
}

fn expect_str<'a>(raw: &'a Value, kind: &str) -> Result<&'a str> {
    raw.as_str()
        .ok_or_else(|| ContentGraphError::parse(format!("expected {kind} text, got {raw}")))
}

pub(crate) fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| ContentGraphError::parse(format!("failed to serialize value: {e}")))
}

/// Parse a date/datetime into an RFC 3339 UTC timestamp with milliseconds.
///
/// Accepts full RFC 3339, minute-precision datetimes with or without an
/// offset (`2024-05-01T10:30+02:00`), and plain dates (midnight UTC).
pub fn parse_date(raw: &Value) -> Result<String> {
    let text = raw.as_str().ok_or_else(|| ContentGraphError::InvalidDate {
        value: raw.to_string(),
        message: "not a string".into(),
    })?;

    let parsed: Option<DateTime<Utc>> = DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M%:z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        });

    parsed
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| ContentGraphError::InvalidDate {
            value: text.to_string(),
            message: "unrecognized date format".into(),
        })
}
