//! Configuration loading and management.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::Result;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub provider settings.
    pub github: GitHubConfig,
    /// GitLab provider settings.
    pub gitlab: GitLabConfig,
    /// Semgrep invocation settings.
    pub semgrep: SemgrepConfig,
    /// HTTP client settings for provider calls.
    pub http: HttpConfig,
    /// Output settings.
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Use this for explicit `--config`
    /// flags. Env vars with `SASTBLAME_` prefix override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(crate::core::Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed("SASTBLAME_").split("__"))
            .extract()
            .map_err(|e| crate::core::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration from a directory, looking for sastblame.toml or
    /// .sastblame/sastblame.toml.
    ///
    /// Missing files are silently skipped (defaults are used).
    /// Env vars with `SASTBLAME_` prefix override file/default values.
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join("sastblame.toml")))
            .merge(Toml::file(dir.join(".sastblame/sastblame.toml")))
            .merge(Env::prefixed("SASTBLAME_").split("__"))
            .extract()
            .map_err(|e| crate::core::Error::Config(e.to_string()))?;
        Ok(config)
    }

    /// Create default config file content.
    pub fn default_toml() -> &'static str {
        include_str!("default_config.toml")
    }
}

/// GitHub provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Personal access token. Overridden by --github-token / GITHUB_TOKEN.
    pub token: Option<String>,
    /// GraphQL endpoint; override for GitHub Enterprise.
    pub graphql_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            graphql_url: "https://api.github.com/graphql".to_string(),
        }
    }
}

/// GitLab provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitLabConfig {
    /// Personal access token. Overridden by --gitlab-token / GITLAB_TOKEN.
    pub token: Option<String>,
    /// Extra self-hosted GitLab hostnames resolved as GitLab targets.
    pub hosts: Vec<String>,
}

/// Semgrep invocation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemgrepConfig {
    /// Binary to invoke.
    pub binary: String,
    /// Ruleset passed via --config.
    pub rules: String,
    /// Extra arguments appended to the invocation.
    pub args: Vec<String>,
}

impl Default for SemgrepConfig {
    fn default() -> Self {
        Self {
            binary: "semgrep".to_string(),
            rules: "auto".to_string(),
            args: Vec::new(),
        }
    }
}

/// HTTP client configuration for provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// User-Agent header.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("sastblame/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format, overridden by --format.
    pub format: crate::output::Format,
    /// Colorize text output.
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: crate::output::Format::Text,
            color: true,
        }
    }
}
