//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use contentgraph_core::{
    AssembleConfig, AssembleOutput, ProgressReporter, Renderers, assemble,
};
use contentgraph_render::{BridgeBundler, ComrakRenderer, DisabledBundler, RichTextBundler};
use contentgraph_schema::SchemaDef;
use contentgraph_shared::{
    AppConfig, AssembleOptions, access_token, init_config, load_config, load_config_from,
};
use contentgraph_source::ContentfulClient;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ContentGraph — materialize a headless CMS space into a typed document graph.
#[derive(Parser)]
#[command(
    name = "contentgraph",
    version,
    about = "Fetch a content space and materialize it into typed, hashed documents.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch the space and materialize every document.
    Build {
        /// Schema file (TOML or JSON).
        #[arg(long, default_value = "contentgraph.schema.toml")]
        schema: PathBuf,

        /// Config file (defaults to ~/.contentgraph/contentgraph.toml).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the resulting cache as JSON to this path.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Documents materialized at once (0 = host parallelism).
        #[arg(long)]
        concurrency: Option<usize>,

        /// Dump the raw fetched corpus for inspection.
        #[arg(long)]
        debug_dump: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "contentgraph=info",
        1 => "contentgraph=debug",
        _ => "contentgraph=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    // stdout carries the build summary
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            schema,
            config,
            out,
            concurrency,
            debug_dump,
        } => {
            let args = BuildArgs {
                schema,
                config,
                out,
                concurrency,
                debug_dump,
            };
            cmd_build(args).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

struct BuildArgs {
    schema: PathBuf,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    concurrency: Option<usize>,
    debug_dump: bool,
}

async fn cmd_build(args: BuildArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if args.debug_dump {
        config.debug.dump_raw = true;
    }

    // Validate the token before doing anything
    let token = access_token(&config)?;
    let client = ContentfulClient::new(&config.space, token)?;

    let schema = SchemaDef::load(&args.schema)
        .wrap_err_with(|| format!("failed to load schema {}", args.schema.display()))?;

    let mut options = AssembleOptions::from(&config);
    if let Some(n) = args.concurrency {
        options = options.with_concurrency(n);
    }

    let bridge = BridgeBundler::from_config(&config.rich_text).map(Arc::new);
    let rich_text: Arc<dyn RichTextBundler> = match &bridge {
        Some(bridge) => bridge.clone(),
        None => Arc::new(DisabledBundler),
    };
    let renderers = Renderers {
        markdown: Arc::new(ComrakRenderer::new(config.markdown.clone())),
        rich_text,
    };

    info!(
        space = %config.space.space_id,
        environment = %config.space.environment,
        schema = %args.schema.display(),
        concurrency = options.concurrency,
        "starting build"
    );

    let assemble_config = AssembleConfig {
        schema,
        overrides: config.schema_overrides.clone(),
        renderers,
        options,
    };

    let reporter = CliProgress::new();
    let result = assemble(&client, assemble_config, &reporter).await;

    if let Some(bridge) = &bridge {
        bridge.shutdown().await;
    }
    let output = result?;

    if let Some(out) = &args.out {
        write_cache(out, &output)?;
    }

    print_summary(&config, &output, args.out.as_deref());
    Ok(())
}

fn write_cache(path: &Path, output: &AssembleOutput) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&output.cache)?;
    std::fs::write(path, json).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn print_summary(config: &AppConfig, output: &AssembleOutput, out: Option<&Path>) {
    println!();
    println!("  Build complete!");
    println!("  Space:       {}", config.space.space_id);
    println!("  Entries:     {}", output.entry_count);
    println!("  Assets:      {}", output.asset_count);
    println!("  Documents:   {}", output.cache.len());
    println!("  Diagnostics: {}", output.diagnostics.len());
    if let Some(out) = out {
        println!("  Output:      {}", out.display());
    }
    println!("  Time:        {:.1}s", output.elapsed.as_secs_f64());
    println!();

    for diagnostic in &output.diagnostics {
        println!(
            "  warning: {} ({}) field '{}': {}",
            diagnostic.entry_id, diagnostic.type_name, diagnostic.field, diagnostic.message
        );
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_materialized(&self, id: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Materializing [{current}/{total}] {id}"));
    }

    fn done(&self, output: &AssembleOutput) {
        self.spinner.finish_with_message(format!(
            "Materialized {} documents",
            output.cache.len()
        ));
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
