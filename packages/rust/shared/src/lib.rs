//! Shared types, error model, and configuration for taskdocs.
//!
//! This crate is the foundation depended on by all other taskdocs crates.
//! It provides:
//! - [`TaskDocsError`], the unified error type
//! - Domain types ([`TaskRecord`], [`TaskInput`], [`TaskCategory`], [`TaskId`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], [`DocsSources`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DocsConfig, DocsSources, FetchConfig, FetchPoliciesConfig, InventoryConfig,
    InventoryCredentials, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{ErrorPayload, ExhaustionReason, Result, TaskDocsError};
pub use types::{
    CATEGORY_TABLE, DEFAULT_INPUT_TYPE, Provenance, TaskCategory, TaskId, TaskInput, TaskRecord,
};
