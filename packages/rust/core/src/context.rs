//! Read-only state shared by every materialization in one run.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::warn;

use contentgraph_render::{MarkdownRenderer, RichTextBundler};
use contentgraph_schema::{SchemaDef, SchemaOverrides};
use contentgraph_shared::{AssembleOptions, Diagnostic, RawAsset, RawEntry};

/// Entries and assets indexed by identifier. Built once per run.
#[derive(Debug, Default)]
pub struct CorpusIndex {
    entries: HashMap<String, RawEntry>,
    assets: HashMap<String, RawAsset>,
}

impl CorpusIndex {
    pub fn new(entries: Vec<RawEntry>, assets: Vec<RawAsset>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.sys.id.clone(), e))
                .collect(),
            assets: assets.into_iter().map(|a| (a.sys.id.clone(), a)).collect(),
        }
    }

    pub fn entry(&self, id: &str) -> Option<&RawEntry> {
        self.entries.get(id)
    }

    pub fn asset(&self, id: &str) -> Option<&RawAsset> {
        self.assets.get(id)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }
}

/// External renderers used by text-bearing fields.
#[derive(Clone)]
pub struct Renderers {
    pub markdown: Arc<dyn MarkdownRenderer>,
    pub rich_text: Arc<dyn RichTextBundler>,
}

/// Everything a field resolution may read, plus the diagnostics sink.
pub struct MaterializeContext {
    pub index: CorpusIndex,
    pub schema: SchemaDef,
    pub overrides: SchemaOverrides,
    pub renderers: Renderers,
    pub options: AssembleOptions,
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl MaterializeContext {
    pub fn new(
        index: CorpusIndex,
        schema: SchemaDef,
        overrides: SchemaOverrides,
        renderers: Renderers,
        options: AssembleOptions,
    ) -> Self {
        Self {
            index,
            schema,
            overrides,
            renderers,
            options,
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    /// Record a non-fatal data problem.
    pub async fn diagnose(&self, diagnostic: Diagnostic) {
        warn!(
            entry_id = %diagnostic.entry_id,
            type_name = %diagnostic.type_name,
            field = %diagnostic.field,
            "{}",
            diagnostic.message
        );
        self.diagnostics.lock().await.push(diagnostic);
    }

    /// Drain the diagnostics recorded so far.
    pub async fn take_diagnostics(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock().await)
    }
}

/// Where the raw values of the fields being resolved come from.
#[derive(Debug, Clone, Copy)]
pub enum FieldSource<'a> {
    /// A fetched entry with localized field values.
    Entry(&'a RawEntry),
    /// An inline list item whose values are already localized.
    Inline(&'a Map<String, Value>),
}

impl<'a> FieldSource<'a> {
    pub fn value(&self, field: &str, locale: &str) -> Option<&'a Value> {
        match self {
            Self::Entry(entry) => entry.field(field, locale),
            Self::Inline(map) => map.get(field).filter(|v| !v.is_null()),
        }
    }

    pub fn passthrough(&self) -> Option<Value> {
        match self {
            Self::Entry(entry) => Some(entry.passthrough()),
            Self::Inline(_) => None,
        }
    }
}

/// Identifies the object whose fields are being resolved, for diagnostics
/// and nesting bounds.
#[derive(Debug, Clone, Copy)]
pub struct Owner<'a> {
    pub entry_id: &'a str,
    pub type_name: &'a str,
    pub depth: usize,
}
