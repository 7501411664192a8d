//! Rich-text (MDX) bundling.
//!
//! Bundling happens outside this process: [`BridgeBundler`] spawns a helper
//! script and talks to it via a JSON-lines stdin/stdout protocol.

use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use contentgraph_shared::{ContentGraphError, Result, RichTextConfig};

/// Compiles raw rich text into executable code.
#[async_trait]
pub trait RichTextBundler: Send + Sync {
    async fn bundle(&self, raw: &str) -> Result<String>;
}

/// Bundler used when no bridge is configured. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledBundler;

#[async_trait]
impl RichTextBundler for DisabledBundler {
    async fn bundle(&self, _raw: &str) -> Result<String> {
        Err(ContentGraphError::RichText(
            "no bundler configured; set [rich_text] command in contentgraph.toml".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Protocol types
// ---------------------------------------------------------------------------

/// Request message sent to the bridge.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum RequestMessage<'a> {
    #[serde(rename = "bundle")]
    Bundle { id: String, source: &'a str },
    #[serde(rename = "shutdown")]
    Shutdown,
}

/// Response message received from the bridge.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseMessage {
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "result")]
    Result { id: String, code: String },
    #[serde(rename = "error")]
    Error {
        #[allow(dead_code)]
        id: String,
        error: String,
    },
}

// ---------------------------------------------------------------------------
// Bridge handle
// ---------------------------------------------------------------------------

/// Handle to the spawned bridge subprocess.
struct BridgeHandle {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    request_counter: u64,
}

impl BridgeHandle {
    async fn spawn(command: &str, config: &RichTextConfig) -> Result<Self> {
        info!(cmd = %command, script = ?config.script, "spawning rich-text bridge");

        let mut cmd = Command::new(command);
        if let Some(script) = &config.script {
            cmd.arg(script);
        }
        if let Some(dir) = &config.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit()) // Bridge logs go to parent stderr
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ContentGraphError::RichText(format!(
                    "failed to spawn bridge: {e}. Is `{command}` installed?"
                ))
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            ContentGraphError::RichText("failed to capture bridge stdin".into())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            ContentGraphError::RichText("failed to capture bridge stdout".into())
        })?;

        let mut handle = Self {
            child,
            stdin,
            reader: BufReader::new(stdout),
            request_counter: 0,
        };

        match handle.read_message().await? {
            ResponseMessage::Ready => {
                info!("bridge is ready");
                Ok(handle)
            }
            other => Err(ContentGraphError::RichText(format!(
                "expected ready message, got: {other:?}"
            ))),
        }
    }

    async fn read_message(&mut self) -> Result<ResponseMessage> {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .await
            .map_err(|e| ContentGraphError::RichText(format!("bridge read error: {e}")))?;

        if line.is_empty() {
            return Err(ContentGraphError::RichText(
                "bridge closed stdout unexpectedly".into(),
            ));
        }

        serde_json::from_str(line.trim()).map_err(|e| {
            let excerpt: String = line.chars().take(200).collect();
            ContentGraphError::RichText(format!("invalid bridge message: {e} (got: {excerpt})"))
        })
    }

    async fn write_message(&mut self, msg: &RequestMessage<'_>) -> Result<()> {
        let mut json = serde_json::to_string(msg).map_err(|e| {
            ContentGraphError::RichText(format!("failed to serialize request: {e}"))
        })?;
        json.push('\n');

        self.stdin.write_all(json.as_bytes()).await.map_err(|e| {
            ContentGraphError::RichText(format!("failed to write to bridge stdin: {e}"))
        })?;
        self.stdin.flush().await.map_err(|e| {
            ContentGraphError::RichText(format!("failed to flush bridge stdin: {e}"))
        })
    }

    async fn bundle(&mut self, source: &str) -> Result<String> {
        self.request_counter += 1;
        let id = format!("req-{}", self.request_counter);

        self.write_message(&RequestMessage::Bundle {
            id: id.clone(),
            source,
        })
        .await?;

        match self.read_message().await? {
            ResponseMessage::Result { id: resp_id, code } => {
                if resp_id != id {
                    return Err(ContentGraphError::RichText(format!(
                        "bridge answered {resp_id}, expected {id}"
                    )));
                }
                Ok(code)
            }
            ResponseMessage::Error { error, .. } => Err(ContentGraphError::RichText(error)),
            ResponseMessage::Ready => Err(ContentGraphError::RichText(
                "unexpected ready message during bundling".into(),
            )),
        }
    }

    async fn shutdown(mut self) {
        let _ = self.write_message(&RequestMessage::Shutdown).await;
        match self.child.wait().await {
            Ok(status) => info!(?status, "bridge exited"),
            Err(e) => warn!("bridge wait error: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// BridgeBundler
// ---------------------------------------------------------------------------

/// [`RichTextBundler`] backed by a long-lived helper process.
///
/// The process is spawned on first use. Requests are serialized: the
/// protocol carries one request in flight at a time.
pub struct BridgeBundler {
    command: String,
    config: RichTextConfig,
    handle: Mutex<Option<BridgeHandle>>,
}

impl BridgeBundler {
    /// Build a bundler from config. Returns `None` when no command is set.
    pub fn from_config(config: &RichTextConfig) -> Option<Self> {
        let command = config.command.clone()?;
        Some(Self {
            command,
            config: config.clone(),
            handle: Mutex::new(None),
        })
    }

    /// Ask the bridge to exit and wait for it.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            handle.shutdown().await;
        }
    }
}

#[async_trait]
impl RichTextBundler for BridgeBundler {
    async fn bundle(&self, raw: &str) -> Result<String> {
        let mut guard = self.handle.lock().await;
        if guard.is_none() {
            *guard = Some(BridgeHandle::spawn(&self.command, &self.config).await?);
        }
        let Some(handle) = guard.as_mut() else {
            return Err(ContentGraphError::RichText("bridge unavailable".into()));
        };

        let result = handle.bundle(raw).await;
        if let Err(e) = &result {
            debug!(error = %e, "bundle request failed");
        }
        result
    }
}
