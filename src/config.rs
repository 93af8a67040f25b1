//! Configuration loading
//!
//! Settings layer in order of precedence: builder overrides, `GOVBENCH_*`
//! environment variables, an optional TOML file, built-in defaults. A
//! `.env` file is honored before the environment is read.

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub benchmark: BenchmarkConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Transport command used to execute script code remotely
    pub command: Option<String>,

    /// Arguments passed to the transport command
    pub args: Vec<String>,

    /// Seconds before an in-flight transport call is abandoned
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Keep running Data transactions after one fails
    pub continue_on_error: bool,

    /// Ask the collaborator to capture the remote debug log
    pub capture_log: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            capture_log: false,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load configuration with no overrides.
    pub fn load() -> Result<Self> {
        Self::builder().build()
    }
}

/// Builder for loading Config with CLI-level overrides
#[derive(Default)]
pub struct ConfigBuilder {
    config_path: Option<String>,
    command: Option<String>,
}

impl ConfigBuilder {
    /// Set the config file path (overrides default search)
    pub fn config_path(mut self, path: Option<String>) -> Self {
        self.config_path = path;
        self
    }

    /// Set the transport command (overrides config file and env vars)
    pub fn command(mut self, command: Option<String>) -> Self {
        self.command = command;
        self
    }

    pub fn build(self) -> Result<Config> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        builder = match &self.config_path {
            Some(path) => builder.add_source(config::File::with_name(path)),
            None => builder.add_source(config::File::with_name("govbench").required(false)),
        };
        builder = builder.add_source(
            config::Environment::with_prefix("GOVBENCH").separator("__"),
        );

        let mut loaded: Config = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        if let Some(command) = self.command {
            loaded.remote.command = Some(command);
        }

        Ok(loaded)
    }
}
