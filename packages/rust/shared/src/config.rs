//! Application configuration for taskdocs.
//!
//! User config lives at `~/.taskdocs/taskdocs.toml`.
//! CLI flags override config file values, which override defaults.
//! Credentials are never stored in the file, only the names of the
//! environment variables that hold them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TaskDocsError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "taskdocs.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".taskdocs";

// ---------------------------------------------------------------------------
// Config structs (matching taskdocs.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Public documentation endpoints.
    #[serde(default)]
    pub docs: DocsConfig,

    /// Fetch layer policies.
    #[serde(default)]
    pub fetch: FetchPoliciesConfig,

    /// Live inventory API settings.
    #[serde(default)]
    pub inventory: InventoryConfig,
}

/// `[docs]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsConfig {
    /// Raw URL of the task index document.
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Base URL that relative task document paths are resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Human-facing documentation site, used for synthesized doc links.
    #[serde(default = "default_public_docs_url")]
    pub public_docs_url: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            base_url: default_base_url(),
            public_docs_url: default_public_docs_url(),
        }
    }
}

fn default_index_url() -> String {
    "https://raw.githubusercontent.com/MicrosoftDocs/azure-devops-yaml-schema/main/task-reference/index.md".into()
}
fn default_base_url() -> String {
    "https://raw.githubusercontent.com/MicrosoftDocs/azure-devops-yaml-schema/main/task-reference/".into()
}
fn default_public_docs_url() -> String {
    "https://learn.microsoft.com/azure/devops/pipelines/tasks/reference/".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchPoliciesConfig {
    /// Per-request deadline.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Total attempts per request, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff on transient errors.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Delay used when a 429 response carries no Retry-After header.
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    /// Cache entry lifetime.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for FetchPoliciesConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}
fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1_000
}
fn default_rate_limit_delay_ms() -> u64 {
    2_000
}
fn default_cache_ttl_secs() -> u64 {
    3_600
}

/// `[inventory]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Name of the env var holding the organization name.
    #[serde(default = "default_organization_env")]
    pub organization_env: String,

    /// Name of the env var holding the personal access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// API host.
    #[serde(default = "default_inventory_base_url")]
    pub base_url: String,

    /// `api-version` query parameter.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            organization_env: default_organization_env(),
            token_env: default_token_env(),
            base_url: default_inventory_base_url(),
            api_version: default_api_version(),
        }
    }
}

fn default_organization_env() -> String {
    "AZURE_DEVOPS_ORG".into()
}
fn default_token_env() -> String {
    "AZURE_DEVOPS_PAT".into()
}
fn default_inventory_base_url() -> String {
    "https://dev.azure.com".into()
}
fn default_api_version() -> String {
    "7.1".into()
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime fetch configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub rate_limit_delay: Duration,
    pub cache_ttl: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&FetchPoliciesConfig::default())
    }
}

impl From<&FetchPoliciesConfig> for FetchConfig {
    fn from(config: &FetchPoliciesConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            // Zero attempts would never issue a request.
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            rate_limit_delay: Duration::from_millis(config.rate_limit_delay_ms),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
        }
    }
}

/// Resolved public documentation endpoints.
#[derive(Debug, Clone)]
pub struct DocsSources {
    pub index_url: Url,
    pub base_url: Url,
    pub public_docs_url: Url,
}

impl DocsSources {
    /// Parse the configured URLs. Base URLs gain a trailing slash so that
    /// relative document paths join beneath them.
    pub fn from_config(config: &DocsConfig) -> Result<Self> {
        Ok(Self {
            index_url: parse_url("docs.index_url", &config.index_url)?,
            base_url: parse_url("docs.base_url", &with_trailing_slash(&config.base_url))?,
            public_docs_url: parse_url(
                "docs.public_docs_url",
                &with_trailing_slash(&config.public_docs_url),
            )?,
        })
    }

    /// Resolve a task's documentation path against the base URL.
    /// Absolute paths are returned unchanged.
    pub fn document_url(&self, documentation_path: &str) -> Result<Url> {
        self.base_url.join(documentation_path).map_err(|e| {
            TaskDocsError::config(format!(
                "cannot resolve document path '{documentation_path}': {e}"
            ))
        })
    }
}

/// Organization identity and token for the inventory API.
#[derive(Clone)]
pub struct InventoryCredentials {
    pub organization: String,
    pub token: String,
}

impl std::fmt::Debug for InventoryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryCredentials")
            .field("organization", &self.organization)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl InventoryCredentials {
    /// Read credentials from the environment variables named in `config`.
    /// Returns `None` if either is unset or empty.
    pub fn from_env(config: &InventoryConfig) -> Option<Self> {
        let organization = non_empty_env(&config.organization_env)?;
        let token = non_empty_env(&config.token_env)?;
        Some(Self {
            organization,
            token,
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| TaskDocsError::config(format!("invalid {field} '{value}': {e}")))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.taskdocs/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TaskDocsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.taskdocs/taskdocs.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| TaskDocsError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TaskDocsError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TaskDocsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TaskDocsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TaskDocsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("index_url"));
        assert!(toml_str.contains("AZURE_DEVOPS_PAT"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[fetch]
max_attempts = 5

[inventory]
base_url = "http://localhost:9999"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.fetch.max_attempts, 5);
        assert_eq!(config.fetch.timeout_ms, 30_000);
        assert_eq!(config.inventory.base_url, "http://localhost:9999");
        assert_eq!(config.inventory.api_version, "7.1");
        assert!(config.docs.index_url.ends_with("index.md"));
    }

    #[test]
    fn fetch_config_from_policies() {
        let policies = FetchPoliciesConfig {
            max_attempts: 0,
            ..FetchPoliciesConfig::default()
        };
        let fetch = FetchConfig::from(&policies);
        assert_eq!(fetch.max_attempts, 1);
        assert_eq!(fetch.timeout, Duration::from_secs(30));
        assert_eq!(fetch.cache_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn docs_sources_resolve_relative_and_absolute_paths() {
        let docs = DocsConfig {
            index_url: "https://example.com/ref/index.md".into(),
            base_url: "https://example.com/ref".into(),
            public_docs_url: "https://learn.example.com/tasks".into(),
        };
        let sources = DocsSources::from_config(&docs).expect("valid urls");
        assert_eq!(
            sources.document_url("dotnet-core-cli-v2.md").unwrap().as_str(),
            "https://example.com/ref/dotnet-core-cli-v2.md"
        );
        assert_eq!(
            sources
                .document_url("https://other.example.com/a.md")
                .unwrap()
                .as_str(),
            "https://other.example.com/a.md"
        );
        assert_eq!(
            sources.public_docs_url.as_str(),
            "https://learn.example.com/tasks/"
        );
    }

    #[test]
    fn docs_sources_reject_invalid_url() {
        let docs = DocsConfig {
            index_url: "not a url".into(),
            ..DocsConfig::default()
        };
        let err = DocsSources::from_config(&docs).unwrap_err();
        assert!(err.to_string().contains("docs.index_url"));
    }

    #[test]
    fn missing_credentials_yield_none() {
        let config = InventoryConfig {
            organization_env: "TASKDOCS_TEST_NONEXISTENT_ORG_12345".into(),
            token_env: "TASKDOCS_TEST_NONEXISTENT_PAT_12345".into(),
            ..InventoryConfig::default()
        };
        assert!(InventoryCredentials::from_env(&config).is_none());
    }

    #[test]
    fn credentials_debug_redacts_token() {
        let creds = InventoryCredentials {
            organization: "contoso".into(),
            token: "secret-pat".into(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("contoso"));
        assert!(!debug.contains("secret-pat"));
    }
}
