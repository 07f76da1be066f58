use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::client::graphql::GRAPHQL_URL;
use crate::client::rest::REST_BASE_URL;

/// Configuration file structure for bkpipe.
///
/// Holds the API endpoints and credentials so they need not be passed on every
/// run. Command-line flags and environment variables take precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub buildkite: BuildkiteConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildkiteConfig {
    /// Buildkite API access token with GraphQL and REST scopes
    pub token: Option<String>,

    /// Organization slug (e.g., 'acme-inc')
    pub organization: Option<String>,

    /// GraphQL endpoint
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,

    /// REST API base URL
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Default for BuildkiteConfig {
    fn default() -> Self {
        Self {
            token: None,
            organization: None,
            graphql_url: default_graphql_url(),
            rest_url: default_rest_url(),
        }
    }
}

fn default_graphql_url() -> String {
    GRAPHQL_URL.to_string()
}

fn default_rest_url() -> String {
    REST_BASE_URL.to_string()
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./bkpipe.toml, ./bkpipe.json, ./bkpipe.yaml, ./bkpipe.yml
    /// 3. `<config dir>/bkpipe/config.toml` (e.g. `~/.config/bkpipe/config.toml`)
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return load_document(path);
        }

        let candidates = ["bkpipe.toml", "bkpipe.json", "bkpipe.yaml", "bkpipe.yml"]
            .into_iter()
            .map(PathBuf::from)
            .chain(user_config_path());

        for candidate in candidates {
            if candidate.exists() {
                return load_document(&candidate);
            }
        }

        Ok(Self::default())
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bkpipe").join("config.toml"))
}

/// Load a TOML, JSON or YAML document, picking the format by extension.
///
/// Used for both the configuration and pipeline definition files.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    match extension {
        "toml" => toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML: {}", path.display())),
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse JSON: {}", path.display())),
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML: {}", path.display())),
        _ => {
            // Try TOML first, then JSON, then YAML
            toml::from_str(&contents)
                .ok()
                .or_else(|| serde_json::from_str(&contents).ok())
                .map_or_else(|| serde_yaml::from_str(&contents), Ok)
                .with_context(|| format!("Failed to parse file: {}", path.display()))
        }
    }
}
