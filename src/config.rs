use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sync::DEFAULT_MAX_PARALLEL;

/// Main configuration structure for ghmirror
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Root of the mirror tree; each owner gets `{mirror_root}/{owner}`
    #[serde(default = "default_mirror_root")]
    pub mirror_root: String,

    /// GitHub API settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Synchronization behavior settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Where the Authorization header comes from
    #[serde(default)]
    pub auth: AuthConfig,
}

/// GitHub API configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubConfig {
    /// Base URL of the REST API
    #[serde(default = "default_api_root")]
    pub api_root: String,

    /// Value sent as the `User-Agent` header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Items requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

/// Synchronization configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncConfig {
    /// Maximum concurrent clone/fetch operations
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Git executable to invoke
    #[serde(default = "default_git_program")]
    pub git_program: String,
}

/// Credential source configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    /// Shell script whose stdout is the full Authorization header value
    #[serde(default = "default_auth_script")]
    pub script: Option<String>,

    /// Environment variable holding a personal access token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Ask the GitHub CLI for a token
    #[serde(default = "default_true")]
    pub use_gh_cli: bool,
}

// Default value functions
fn default_mirror_root() -> String {
    "${HOME}/tmp/repos".to_string()
}
fn default_api_root() -> String {
    "https://api.github.com".to_string()
}
fn default_user_agent() -> String {
    "curl".to_string()
}
fn default_page_size() -> usize {
    100
}
fn default_max_parallel() -> usize {
    DEFAULT_MAX_PARALLEL
}
fn default_git_program() -> String {
    "git".to_string()
}
fn default_auth_script() -> Option<String> {
    Some("~/.mirror-auth".to_string())
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_root: default_api_root(),
            user_agent: default_user_agent(),
            page_size: default_page_size(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            git_program: default_git_program(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            script: default_auth_script(),
            token_env: default_token_env(),
            use_gh_cli: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            tracing::debug!("No configuration at {:?}, using defaults", config_path);
            let mut config = Self::default();
            config.expand_paths()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file, creating its directory if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("ghmirror").join("config.yml"))
    }

    /// Expand environment variables and `~` in configured paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.mirror_root = shellexpand::full(&self.mirror_root)
            .context("Failed to expand mirror_root path")?
            .into_owned();

        if let Some(script) = self.auth.script.as_mut() {
            *script = shellexpand::full(script.as_str())
                .context("Failed to expand auth.script path")?
                .into_owned();
        }

        Ok(())
    }

    /// Replace the mirror root, expanding it like a configured value
    pub fn override_mirror_root(&mut self, path: &str) -> Result<()> {
        self.mirror_root = shellexpand::full(path)
            .context("Failed to expand --path")?
            .into_owned();
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mirror_root: default_mirror_root(),
            github: GitHubConfig::default(),
            sync: SyncConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}
