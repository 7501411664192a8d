//! Graph assembly: fetch the corpus, partition it by document type, and
//! materialize every document under a concurrency bound.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use contentgraph_schema::{SchemaDef, SchemaOverrides};
use contentgraph_shared::{
    AssembleOptions, Cache, ContentGraphError, Diagnostic, RawEntry, Result,
    SchemaOverridesConfig,
};
use contentgraph_source::{CollectionSource, RawCorpus};

use crate::context::{CorpusIndex, MaterializeContext, Renderers};
use crate::document::materialize_document;

/// Inputs to one assembly run.
#[derive(Clone)]
pub struct AssembleConfig {
    pub schema: SchemaDef,
    /// Raw overrides, normalized against the fetched content types.
    pub overrides: SchemaOverridesConfig,
    pub renderers: Renderers,
    pub options: AssembleOptions,
}

/// Result of an assembly run.
#[derive(Debug)]
pub struct AssembleOutput {
    /// Document id → cache item.
    pub cache: Cache,
    /// Non-fatal data problems, in no particular order.
    pub diagnostics: Vec<Diagnostic>,
    /// Entries in the fetched corpus (documents and nested alike).
    pub entry_count: usize,
    pub asset_count: usize,
    pub elapsed: Duration,
}

/// Progress callback for reporting assembly status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called each time a document finishes materializing.
    fn document_materialized(&self, id: &str, current: usize, total: usize);
    /// Called when assembly completes successfully.
    fn done(&self, output: &AssembleOutput);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_materialized(&self, _id: &str, _current: usize, _total: usize) {}
    fn done(&self, _output: &AssembleOutput) {}
}

/// Fetch everything from `source` and materialize every document.
///
/// The first fatal error is returned once in-flight documents settle; no
/// partial cache is produced.
#[instrument(skip_all)]
pub async fn assemble(
    source: &dyn CollectionSource,
    config: AssembleConfig,
    progress: &dyn ProgressReporter,
) -> Result<AssembleOutput> {
    let start = Instant::now();

    progress.phase("Fetching corpus");
    let corpus = RawCorpus::fetch(source).await?;

    if let Some(dir) = &config.options.dump_dir {
        // Debug aid only; a failed dump never fails the build.
        if let Err(e) = corpus.dump(dir) {
            warn!(dir = %dir.display(), error = %e, "failed to dump raw corpus");
        }
    }

    let mut output = materialize_corpus(corpus, config, progress).await?;
    output.elapsed = start.elapsed();

    info!(
        documents = output.cache.len(),
        diagnostics = output.diagnostics.len(),
        elapsed_ms = output.elapsed.as_millis() as u64,
        "assembly complete"
    );
    progress.done(&output);

    Ok(output)
}

/// Materialize an already-fetched corpus.
pub async fn materialize_corpus(
    corpus: RawCorpus,
    config: AssembleConfig,
    progress: &dyn ProgressReporter,
) -> Result<AssembleOutput> {
    let start = Instant::now();
    let AssembleConfig {
        schema,
        overrides,
        renderers,
        options,
    } = config;

    let overrides = SchemaOverrides::normalize(&corpus.content_types, &overrides);
    let worklist = plan(&corpus.entries, &schema, &overrides);
    let concurrency = options.concurrency.max(1);

    info!(
        documents = worklist.len(),
        entries = corpus.entries.len(),
        concurrency,
        "materializing documents"
    );
    progress.phase("Materializing documents");

    let ctx = Arc::new(MaterializeContext::new(
        CorpusIndex::new(corpus.entries, corpus.assets),
        schema,
        overrides,
        renderers,
        options,
    ));
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let total = worklist.len();

    let mut tasks = JoinSet::new();
    for (entry_id, def_index) in worklist {
        let ctx = Arc::clone(&ctx);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            // A closed semaphore means another document already failed.
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return None;
            };

            let (Some(entry), Some(def)) = (
                ctx.index.entry(&entry_id),
                ctx.schema.document_types.get(def_index),
            ) else {
                return Some(Err(ContentGraphError::DanglingEntry { id: entry_id }));
            };

            Some(materialize_document(&ctx, entry, def).await)
        });
    }

    let mut cache = Cache::new();
    let mut first_error: Option<ContentGraphError> = None;

    while let Some(joined) = tasks.join_next().await {
        let outcome = match joined {
            Ok(Some(outcome)) => outcome,
            Ok(None) => continue,
            Err(e) => Err(ContentGraphError::Task(e.to_string())),
        };

        match outcome {
            Ok(item) => {
                let id = item.document.id.clone();
                cache.insert(id.clone(), item);
                progress.document_materialized(&id, cache.len(), total);
            }
            Err(e) if first_error.is_none() => {
                error!(error = %e, "document failed, draining in-flight work");
                semaphore.close();
                first_error = Some(e);
            }
            Err(e) => debug!(error = %e, "further document failure"),
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    Ok(AssembleOutput {
        cache,
        diagnostics: ctx.take_diagnostics().await,
        entry_count: ctx.index.entry_count(),
        asset_count: ctx.index.asset_count(),
        elapsed: start.elapsed(),
    })
}

/// Pair every entry with the document type its content type maps to.
///
/// Entries of nested content types, or of document types the schema does
/// not declare, are left out.
fn plan(
    entries: &[RawEntry],
    schema: &SchemaDef,
    overrides: &SchemaOverrides,
) -> Vec<(String, usize)> {
    let worklist: Vec<(String, usize)> = entries
        .iter()
        .filter_map(|entry| {
            let type_name = overrides.document_type_name(entry.content_type_id()?)?;
            let def_index = schema
                .document_types
                .iter()
                .position(|def| def.name == type_name)?;
            Some((entry.id().to_string(), def_index))
        })
        .collect();

    debug!(
        selected = worklist.len(),
        skipped = entries.len() - worklist.len(),
        "partitioned entries by document type"
    );
    worklist
}
