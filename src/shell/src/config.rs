use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_valid::Validate;
use softpos_demo_core::TerminalConfig;
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

/// Environment variables that override the config file
pub const ENV_BACKEND_URL: &str = "SOFTPOS_BACKEND_URL";
pub const ENV_IMEI: &str = "SOFTPOS_IMEI";
pub const ENV_KERNEL_VERSION: &str = "SOFTPOS_KERNEL_VERSION";

/// Settings only the native shell needs
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ShellSettings {
    /// Directory holding `storage.json`
    pub data_dir: PathBuf,

    #[validate(minimum = 1)]
    #[validate(maximum = 600)]
    pub request_timeout_secs: u64,

    /// Kernel module loaded when the backend kernel is unavailable
    pub mock_kernel_path: Option<PathBuf>,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".softpos"),
            request_timeout_secs: 30,
            mock_kernel_path: None,
        }
    }
}

impl ShellSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("storage.json")
    }
}

/// Effective configuration of the shell
///
/// Both parts are read from the same JSON document: the terminal fields are
/// the ones a browser shell reads from its `config.json`, the shell settings
/// sit next to them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShellConfig {
    pub terminal: TerminalConfig,
    pub shell: ShellSettings,
}

impl ShellConfig {
    /// Load defaults, then `path`, then the environment
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_env(path, |key| env::var(key).ok())
    }

    pub fn load_with_env(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        match read_document(path) {
            Ok(Some(document)) => {
                info!("loaded configuration from {}", path.display());
                config.apply(&document)?;
            }
            Ok(None) => {
                warn!("config file {} not found, using defaults", path.display());
            }
            Err(e) => {
                warn!("failed to read config file, using defaults: {e:#}");
            }
        }

        config.apply_env(lookup);
        config.validate()?;

        debug!("effective configuration: {config:?}");
        Ok(config)
    }

    /// Merge a partial JSON document over the current values
    pub fn apply(&mut self, document: &Value) -> Result<()> {
        self.terminal
            .merge(document)
            .map_err(|e| anyhow!("failed to apply terminal configuration: {e}"))?;

        self.shell = serde_json::from_value(document.clone())
            .context("failed to apply shell configuration")?;

        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BACKEND_URL) {
            info!("backend url overridden by {ENV_BACKEND_URL}");
            self.terminal.backend_url = url;
        }

        if let Some(imei) = lookup(ENV_IMEI) {
            info!("imei overridden by {ENV_IMEI}");
            self.terminal.default_imei = imei;
        }

        if let Some(version) = lookup(ENV_KERNEL_VERSION) {
            info!("kernel version overridden by {ENV_KERNEL_VERSION}");
            self.terminal.kernel_version = Some(version).filter(|v| !v.is_empty());
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.terminal.ensure_valid().map_err(anyhow::Error::msg)?;

        Validate::validate(&self.shell)
            .map_err(|e| anyhow!("invalid shell configuration: {e}"))
    }
}

fn read_document(path: &Path) -> Result<Option<Value>> {
    if !path
        .try_exists()
        .context("failed to check if config file exists")?
    {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .context(format!("failed to read {}", path.display()))?;

    serde_json::from_str(&content)
        .map(Some)
        .context(format!("failed to parse {}", path.display()))
}
