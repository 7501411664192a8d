//! Type definitions consumed by the materializer.
//!
//! This crate provides:
//! - [`FieldDef`] / [`FieldKind`] — the closed set of field kinds
//! - [`DocumentTypeDef`], [`NestedTypeDef`], [`SchemaDef`] — schema input
//! - [`SchemaOverrides`] — content type id → local type name

pub mod field;
pub mod overrides;
pub mod types;

pub use field::{FieldDef, FieldKind};
pub use overrides::{SchemaOverrides, TypeOverride, pascal_case};
pub use types::{DocumentTypeDef, NestedTypeDef, SchemaDef};
