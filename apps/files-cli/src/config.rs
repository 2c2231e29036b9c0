//! Front end configuration.
//!
//! Stored as JSON at `~/.config/taskpilot/config.json` (`%APPDATA%` on
//! Windows). Environment variables override the file; command-line flags
//! override both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use taskpilot_file_client::ClientConfig;
use taskpilot_protocol::constants::{DEFAULT_API_BASE_URL, DEFAULT_MAX_FILES, REQUEST_TIMEOUT};

/// Overrides `api_base_url`.
pub const ENV_API_URL: &str = "TASKPILOT_API_URL";
/// Overrides `api_token`.
pub const ENV_API_TOKEN: &str = "TASKPILOT_API_TOKEN";

/// File manager settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// API root, e.g. `http://localhost:3001/api`.
    pub api_base_url: String,

    /// Applied to every request.
    pub request_timeout_secs: u64,

    /// Most stored files allowed before uploads are refused.
    pub max_files: usize,

    /// Where downloads go. Empty means the working directory.
    pub download_dir: String,

    /// Bearer token for the API, if it requires one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            request_timeout_secs: REQUEST_TIMEOUT.as_secs(),
            max_files: DEFAULT_MAX_FILES,
            download_dir: String::new(),
            api_token: None,
        }
    }
}

impl FilesConfig {
    /// Loads the config file, then applies environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Reads `path`. A missing file yields defaults; an unparsable one is
    /// logged and also yields defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Applies `TASKPILOT_*` overrides looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = var(ENV_API_TOKEN).filter(|v| !v.is_empty()) {
            self.api_token = Some(token);
        }
    }

    /// Saves to the default location.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_path()?)
    }

    /// Writes the config to `path` with owner-only permissions.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, &json)?;
        set_permissions_0600(path);

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Transport settings derived from this config.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            bearer_token: self.api_token.clone(),
            ..ClientConfig::default()
        }
    }

    /// Download target, falling back to the working directory.
    pub fn download_dir(&self) -> PathBuf {
        if self.download_dir.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(&self.download_dir)
        }
    }

    /// Copy safe to print: the token is masked.
    pub fn redacted(&self) -> Self {
        Self {
            api_token: self.api_token.as_ref().map(|_| "********".into()),
            ..self.clone()
        }
    }
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

/// Returns `taskpilot/config.json` under the platform config directory.
pub fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("taskpilot").join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config"))
    }
}
