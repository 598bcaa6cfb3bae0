//! Live task inventory.
//!
//! Lists task definitions installed in an organization through the
//! `distributedtask/tasks` REST endpoint and adapts them into the shared
//! [`TaskRecord`] shape. Requests go through the shared [`Fetcher`], so they
//! are cached and retried like every other document.

mod adapter;
mod definition;

use std::sync::Arc;

use tracing::{debug, instrument};
use url::Url;

use taskdocs_fetch::{FetchOptions, Fetcher};
use taskdocs_shared::{
    InventoryConfig, InventoryCredentials, Result, TaskDocsError, TaskId, TaskRecord,
};

pub use adapter::{documentation_link, kebab_case, synthesize_syntax, to_task_record};
pub use definition::{TaskDefinition, TaskDefinitionInput, TaskDefinitionList, TaskVersion};

// ---------------------------------------------------------------------------
// InventoryClient
// ---------------------------------------------------------------------------

/// Client for one organization's task inventory.
pub struct InventoryClient {
    fetcher: Arc<Fetcher>,
    credentials: InventoryCredentials,
    endpoint: Url,
}

impl std::fmt::Debug for InventoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryClient")
            .field("credentials", &self.credentials)
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl InventoryClient {
    /// Build a client for `credentials.organization` on `config.base_url`.
    pub fn new(
        fetcher: Arc<Fetcher>,
        credentials: InventoryCredentials,
        config: &InventoryConfig,
    ) -> Result<Self> {
        let endpoint = tasks_endpoint(config, &credentials.organization)?;
        Ok(Self {
            fetcher,
            credentials,
            endpoint,
        })
    }

    /// Build a client from the environment variables named in `config`.
    ///
    /// Fails with `NotConfigured` when either variable is missing.
    pub fn from_env(fetcher: Arc<Fetcher>, config: &InventoryConfig) -> Result<Self> {
        let credentials = InventoryCredentials::from_env(config).ok_or_else(|| {
            TaskDocsError::NotConfigured(format!(
                "set {} and {} to query the task inventory",
                config.organization_env, config.token_env
            ))
        })?;
        Self::new(fetcher, credentials, config)
    }

    pub fn organization(&self) -> &str {
        &self.credentials.organization
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Every task definition installed in the organization.
    #[instrument(skip_all, fields(org = %self.credentials.organization))]
    pub async fn list_task_definitions(&self) -> Result<Vec<TaskDefinition>> {
        // Personal access tokens go in the password slot with an empty user.
        let opts = FetchOptions::default().with_basic_auth("", self.credentials.token.as_str());
        let list: TaskDefinitionList = self
            .fetcher
            .fetch_json(self.endpoint.as_str(), &opts)
            .await?;
        debug!(
            definitions = list.value.len(),
            reported = ?list.count,
            "task inventory listed"
        );
        Ok(list.value)
    }

    /// The newest definition matching `id` by case-insensitive name and
    /// exact major version.
    pub async fn find_task_definition(&self, id: &TaskId) -> Result<Option<TaskDefinition>> {
        let definitions = self.list_task_definitions().await?;
        Ok(select_definition(definitions, id))
    }
}

/// `{base}/{org}/_apis/distributedtask/tasks?api-version={v}`.
fn tasks_endpoint(config: &InventoryConfig, organization: &str) -> Result<Url> {
    let mut url = Url::parse(&config.base_url).map_err(|e| {
        TaskDocsError::config(format!("invalid inventory.base_url '{}': {e}", config.base_url))
    })?;

    url.path_segments_mut()
        .map_err(|_| {
            TaskDocsError::config(format!(
                "inventory.base_url '{}' cannot carry a path",
                config.base_url
            ))
        })?
        .pop_if_empty()
        .extend([organization, "_apis", "distributedtask", "tasks"]);
    url.query_pairs_mut()
        .append_pair("api-version", &config.api_version);

    Ok(url)
}

/// Pick the highest version among definitions matching `id`.
pub fn select_definition(
    definitions: Vec<TaskDefinition>,
    id: &TaskId,
) -> Option<TaskDefinition> {
    definitions
        .into_iter()
        .filter(|def| {
            def.name.eq_ignore_ascii_case(&id.name) && id.matches_major(def.version.major)
        })
        .max_by_key(|def| def.version)
}

/// Adapt a full listing. Order follows the API response.
pub fn to_task_records(
    definitions: &[TaskDefinition],
    public_docs_url: &Url,
) -> Vec<TaskRecord> {
    definitions
        .iter()
        .map(|def| to_task_record(def, public_docs_url))
        .collect()
}
