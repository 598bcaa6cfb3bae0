//! Source selection and fallback for task lookups and search.
//!
//! The live inventory is consulted first when credentials are present. Any
//! failure on that path is logged and absorbed, and the public documentation
//! (index + per-task page) answers instead.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use taskdocs_fetch::{FetchOptions, Fetcher};
use taskdocs_index::{find_stub, group_by_category, load_task_index};
use taskdocs_inventory::{InventoryClient, to_task_record, to_task_records};
use taskdocs_shared::{
    AppConfig, DocsSources, ExhaustionReason, FetchConfig, InventoryCredentials, Provenance,
    Result, TaskCategory, TaskDocsError, TaskId, TaskRecord,
};

use crate::search::filter_tasks;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A single resolved task and the source that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTask {
    pub source: Provenance,
    pub task: TaskRecord,
}

/// Search hits, all from the same source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub source: Provenance,
    pub tasks: Vec<TaskRecord>,
}

/// One entry of the category listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: TaskCategory,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

pub struct Resolver {
    fetcher: Arc<Fetcher>,
    sources: DocsSources,
    inventory: Option<InventoryClient>,
}

impl Resolver {
    pub fn new(
        fetcher: Arc<Fetcher>,
        sources: DocsSources,
        inventory: Option<InventoryClient>,
    ) -> Self {
        Self {
            fetcher,
            sources,
            inventory,
        }
    }

    /// Wire a resolver from application config. The inventory path is
    /// enabled only when its credentials are present in the environment.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::with_credentials(config, InventoryCredentials::from_env(&config.inventory))
    }

    /// Like [`Resolver::from_config`], with explicit inventory credentials.
    ///
    /// Only the fetch and docs settings can fail construction. An inventory
    /// client that cannot be built is logged and left out.
    pub fn with_credentials(
        config: &AppConfig,
        credentials: Option<InventoryCredentials>,
    ) -> Result<Self> {
        let fetcher = Arc::new(Fetcher::new(FetchConfig::from(&config.fetch))?);
        let sources = DocsSources::from_config(&config.docs)?;

        let inventory = match credentials {
            None => {
                debug!(
                    organization_env = %config.inventory.organization_env,
                    token_env = %config.inventory.token_env,
                    "inventory disabled, credentials not set"
                );
                None
            }
            Some(credentials) => {
                match InventoryClient::new(Arc::clone(&fetcher), credentials, &config.inventory) {
                    Ok(client) => Some(client),
                    Err(e) => {
                        warn!(error = %e, "inventory unavailable, using public docs");
                        None
                    }
                }
            }
        };

        Ok(Self::new(fetcher, sources, inventory))
    }

    /// Drop the inventory client so every request uses the public docs.
    pub fn without_inventory(mut self) -> Self {
        self.inventory = None;
        self
    }

    pub fn has_inventory(&self) -> bool {
        self.inventory.is_some()
    }

    /// Resolve one `Name@Version` identifier.
    ///
    /// Malformed identifiers are rejected before any request. When neither
    /// source yields a record the error is
    /// [`TaskDocsError::SourceExhausted`], whose reason tells an unknown task
    /// apart from a known task whose page could not be read.
    #[instrument(skip(self))]
    pub async fn get_task(&self, identifier: &str) -> Result<ResolvedTask> {
        let id = TaskId::parse(identifier)?;

        if let Some(task) = self.task_from_inventory(&id).await {
            info!(task = %task.full_name, source = %Provenance::Api, "task resolved");
            return Ok(ResolvedTask {
                source: Provenance::Api,
                task,
            });
        }

        let task = self.task_from_public_docs(&id).await?;
        info!(task = %task.full_name, source = %Provenance::PublicDocs, "task resolved");
        Ok(ResolvedTask {
            source: Provenance::PublicDocs,
            task,
        })
    }

    /// Free-text search, optionally restricted to one category.
    ///
    /// The inventory listing is preferred; any failure there falls back to
    /// the public index. Errors are returned only when the public index
    /// itself cannot be loaded.
    #[instrument(skip(self))]
    pub async fn search_tasks(
        &self,
        query: &str,
        category: Option<TaskCategory>,
    ) -> Result<SearchResult> {
        let (source, records) = match self.inventory_listing().await {
            Some(records) => (Provenance::Api, records),
            None => (Provenance::PublicDocs, self.public_index().await?),
        };

        let tasks = filter_tasks(records, query, category);
        info!(%source, hits = tasks.len(), "search complete");
        Ok(SearchResult { source, tasks })
    }

    /// Task counts per category from the public index, in fixed order.
    pub async fn list_categories(&self) -> Result<Vec<CategorySummary>> {
        let stubs = self.public_index().await?;
        Ok(group_by_category(&stubs)
            .into_iter()
            .map(|(category, members)| CategorySummary {
                category,
                count: members.len(),
            })
            .collect())
    }

    // -----------------------------------------------------------------------
    // Inventory path (failures absorbed)
    // -----------------------------------------------------------------------

    async fn task_from_inventory(&self, id: &TaskId) -> Option<TaskRecord> {
        let client = self.inventory.as_ref()?;
        match client.find_task_definition(id).await {
            Ok(Some(def)) => Some(to_task_record(&def, &self.sources.public_docs_url)),
            Ok(None) => {
                debug!(task = %id, "not in inventory");
                None
            }
            Err(e) => {
                warn!(task = %id, error = %e, "inventory lookup failed, using public docs");
                None
            }
        }
    }

    async fn inventory_listing(&self) -> Option<Vec<TaskRecord>> {
        let Some(client) = self.inventory.as_ref() else {
            debug!("inventory not configured, using public index");
            return None;
        };
        match client.list_task_definitions().await {
            Ok(defs) => Some(to_task_records(&defs, &self.sources.public_docs_url)),
            Err(e) => {
                warn!(error = %e, "inventory listing failed, using public index");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Public documentation path
    // -----------------------------------------------------------------------

    async fn public_index(&self) -> Result<Vec<TaskRecord>> {
        load_task_index(&self.fetcher, &self.sources.index_url, &FetchOptions::default()).await
    }

    async fn task_from_public_docs(&self, id: &TaskId) -> Result<TaskRecord> {
        let full_name = id.full_name();
        let stubs = self.public_index().await?;

        let Some(stub) = find_stub(&stubs, &full_name) else {
            return Err(TaskDocsError::SourceExhausted {
                identifier: full_name,
                reason: ExhaustionReason::UnknownIdentifier,
            });
        };

        let url = self.sources.document_url(&stub.documentation_path)?;
        match self.fetcher.fetch(url.as_str(), &FetchOptions::default()).await {
            Ok(md) => Ok(taskdocs_markdown::extract_task(stub, &md)),
            Err(e) => {
                warn!(task = %full_name, %url, error = %e, "task documentation unavailable");
                Err(TaskDocsError::SourceExhausted {
                    identifier: full_name,
                    reason: ExhaustionReason::DocumentationUnavailable,
                })
            }
        }
    }
}
