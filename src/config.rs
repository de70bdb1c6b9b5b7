use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::parameters::RawParameters;

/// Configuration file structure, exactly as written on disk.
///
/// Nothing here is validated beyond its shape. Patterns, secrets and
/// parameter expressions are checked when the file is compiled into a
/// [`crate::model::CompiledConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawConfig {
    /// Jenkins instance receiving trigger requests
    pub jenkins: JenkinsConfig,

    /// GitHub API used to fetch push diffs
    #[serde(default)]
    pub github: GitHubConfig,

    /// Webhook listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Repositories whose pushes may trigger jobs
    #[serde(default)]
    pub repositories: Vec<RawRepository>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JenkinsConfig {
    /// Jenkins base URL (e.g., <https://jenkins.example.com>)
    pub url: String,

    /// Extra PEM root certificate to trust when talking to Jenkins
    pub tls_cert: Option<PathBuf>,

    /// Per trigger request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// GitHub API base URL
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Secret key holding a GitHub token, needed for private repositories
    pub token_key: Option<String>,

    /// Per compare request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawRepository {
    pub name: String,
    #[serde(default)]
    pub projects: Vec<RawProject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawProject {
    /// Path prefix within the repository, empty matches every file
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub jobs: Vec<RawJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawJob {
    pub name: String,
    #[serde(default)]
    pub parameters: RawParameters,
    pub token_key: String,
    #[serde(alias = "branch")]
    pub branch_matcher: String,
    pub diff_matcher: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            token_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Parses `contents` according to the extension of `path`.
///
/// Unknown extensions are tried as YAML, then JSON, then TOML.
pub(crate) fn parse_by_extension<T>(path: &Path, contents: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    match extension {
        "yaml" | "yml" => serde_yaml::from_str(contents)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display())),
        "json" => serde_json::from_str(contents)
            .with_context(|| format!("Failed to parse JSON file: {}", path.display())),
        "toml" => toml::from_str(contents)
            .with_context(|| format!("Failed to parse TOML file: {}", path.display())),
        _ => serde_yaml::from_str(contents)
            .or_else(|_| serde_json::from_str(contents))
            .or_else(|_| toml::from_str(contents))
            .with_context(|| format!("Failed to parse file: {}", path.display())),
    }
}

impl RawConfig {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./github2jenkins.yaml, .yml, .json, .toml
    /// 3. `<config dir>/github2jenkins/config.yaml`
    ///
    /// Fails if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let mut candidates: Vec<PathBuf> = [
            "github2jenkins.yaml",
            "github2jenkins.yml",
            "github2jenkins.json",
            "github2jenkins.toml",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();

        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("github2jenkins").join("config.yaml"));
        }

        for candidate in &candidates {
            if candidate.exists() {
                return Self::load_from_path(candidate);
            }
        }

        bail!("No configuration file found, pass one with --config")
    }

    /// Load configuration from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        log::info!("Using configuration at {}", path.display());
        parse_by_extension(path, &contents)
    }
}
