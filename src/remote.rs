//! Remote execution collaborator boundary
//!
//! The core treats remote execution as an opaque request/response exchange:
//! submit source text, get back a structured pass/fail/compile result.
//! Retry-on-expired-session behavior belongs to implementations, not
//! callers.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::RemoteConfig;
use crate::types::{DebugOptions, ExecuteResponse};

#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn execute(&self, code: &str, options: &DebugOptions) -> Result<ExecuteResponse>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteRequest<'a> {
    code: &'a str,
    debug_options: &'a DebugOptions,
}

/// Executes script code by shelling out to a transport command: the request
/// is written to the child's stdin as JSON, the response read from stdout.
/// The configured timeout bounds each call; the child is killed if it
/// overruns.
pub struct CommandExecutor {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let command = config.command.clone().ok_or_else(|| {
            anyhow!("No transport command configured (set remote.command or GOVBENCH_REMOTE__COMMAND)")
        })?;
        Ok(Self::new(
            command,
            config.args.clone(),
            Duration::from_secs(config.timeout_secs),
        ))
    }
}

#[async_trait]
impl RemoteExecutor for CommandExecutor {
    async fn execute(&self, code: &str, options: &DebugOptions) -> Result<ExecuteResponse> {
        let request = serde_json::to_vec(&ExecuteRequest {
            code,
            debug_options: options,
        })?;

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn transport command '{}'", self.command))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("Transport stdin unavailable"))?;
        stdin.write_all(&request).await?;
        drop(stdin);

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| anyhow!("Transport timed out after {}s", self.timeout.as_secs()))?
            .context("Transport failed")?;

        if !output.status.success() {
            return Err(anyhow!("Transport exited with {}", output.status));
        }

        debug!(bytes = output.stdout.len(), "transport response received");
        serde_json::from_slice(&output.stdout).context("Malformed transport response")
    }
}
