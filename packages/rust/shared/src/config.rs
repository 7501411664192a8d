//! Application configuration for ContentGraph.
//!
//! User config lives at `~/.contentgraph/contentgraph.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ContentGraphError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contentgraph.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contentgraph";

// ---------------------------------------------------------------------------
// Config structs (matching contentgraph.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote space coordinates.
    #[serde(default)]
    pub space: SpaceConfig,

    /// Materialization settings.
    #[serde(default)]
    pub materialize: MaterializeConfig,

    /// Markdown renderer options.
    #[serde(default)]
    pub markdown: MarkdownConfig,

    /// Rich-text bundler bridge.
    #[serde(default)]
    pub rich_text: RichTextConfig,

    /// Diagnostic switches.
    #[serde(default)]
    pub debug: DebugConfig,

    /// Content type → local type name mapping.
    #[serde(default)]
    pub schema_overrides: SchemaOverridesConfig,
}

/// `[space]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceConfig {
    /// Space identifier.
    #[serde(default)]
    pub space_id: String,

    /// Environment within the space.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Name of the env var holding the access token (never store the token itself).
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,

    /// Delivery API host.
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            space_id: String::new(),
            environment: default_environment(),
            access_token_env: default_access_token_env(),
            host: default_host(),
        }
    }
}

fn default_environment() -> String {
    "master".into()
}
fn default_access_token_env() -> String {
    "CONTENTFUL_ACCESS_TOKEN".into()
}
fn default_host() -> String {
    "https://cdn.contentful.com".into()
}

/// `[materialize]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializeConfig {
    /// Name of the injected type-discriminator field.
    #[serde(default = "default_type_field")]
    pub type_field: String,

    /// Locale read from localized field values.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Documents materialized at once. `0` means host parallelism.
    #[serde(default)]
    pub concurrency: usize,
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self {
            type_field: default_type_field(),
            locale: default_locale(),
            concurrency: 0,
        }
    }
}

fn default_type_field() -> String {
    "type".into()
}
fn default_locale() -> String {
    "en-US".into()
}

/// `[markdown]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// GitHub-flavored extensions (tables, strikethrough, autolinks, task lists).
    #[serde(default = "default_true")]
    pub gfm: bool,

    /// Pass raw HTML in markdown through to the output.
    #[serde(default)]
    pub unsafe_html: bool,

    /// Render soft line breaks as `<br />`.
    #[serde(default)]
    pub hard_breaks: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            gfm: true,
            unsafe_html: false,
            hard_breaks: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// `[rich_text]` section. Rich-text fields fail to build until a bridge is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RichTextConfig {
    /// Bridge command (e.g., "bun").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Bridge script path passed to the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    /// Working directory for the bridge subprocess.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}

/// `[debug]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Write the raw fetched corpus to `dump_dir`.
    #[serde(default)]
    pub dump_raw: bool,

    /// Directory receiving the raw corpus dump.
    #[serde(default = "default_dump_dir")]
    pub dump_dir: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            dump_raw: false,
            dump_dir: default_dump_dir(),
        }
    }
}

fn default_dump_dir() -> String {
    ".contentgraph/debug".into()
}

/// `[schema_overrides]` section: content type id → local type name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaOverridesConfig {
    #[serde(default)]
    pub document_types: BTreeMap<String, String>,

    #[serde(default)]
    pub nested_types: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Assemble options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime materialization options, merged from config file and CLI flags.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Name of the injected type-discriminator field.
    pub type_field: String,
    /// Locale read from localized field values.
    pub locale: String,
    /// Upper bound on documents materialized at once (always >= 1).
    pub concurrency: usize,
    /// Where to dump the raw corpus, when enabled.
    pub dump_dir: Option<PathBuf>,
}

impl AssembleOptions {
    /// Replace the concurrency bound; `0` falls back to host parallelism.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = resolve_concurrency(concurrency);
        self
    }
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for AssembleOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            type_field: config.materialize.type_field.clone(),
            locale: config.materialize.locale.clone(),
            concurrency: resolve_concurrency(config.materialize.concurrency),
            dump_dir: config
                .debug
                .dump_raw
                .then(|| PathBuf::from(&config.debug.dump_dir)),
        }
    }
}

/// Map a configured concurrency to a usable bound.
fn resolve_concurrency(configured: usize) -> usize {
    if configured > 0 {
        return configured;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contentgraph/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContentGraphError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contentgraph/contentgraph.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ContentGraphError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ContentGraphError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ContentGraphError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ContentGraphError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ContentGraphError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the access token from the env var named in the config.
pub fn access_token(config: &AppConfig) -> Result<String> {
    let var_name = &config.space.access_token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(ContentGraphError::config(format!(
            "access token not found. Set the {var_name} environment variable."
        ))),
    }
}
