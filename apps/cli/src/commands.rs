//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use serde::Serialize;
use tracing::debug;

use taskdocs_core::Resolver;
use taskdocs_shared::{
    AppConfig, TaskCategory, TaskDocsError, init_config, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// taskdocs: look up pipeline task documentation.
#[derive(Parser)]
#[command(
    name = "taskdocs",
    version,
    about = "Resolve pipeline task documentation from the live inventory or the public reference.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read configuration from this file instead of ~/.taskdocs/taskdocs.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Skip the live inventory even when credentials are set.
    #[arg(long, global = true)]
    pub no_inventory: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Resolve one task by `Name@MajorVersion`.
    Get {
        /// Task identifier, e.g. `DotNetCoreCLI@2`.
        identifier: String,
    },

    /// Search tasks by name, display name or description.
    Search {
        /// Case-insensitive substring. Empty lists every task.
        #[arg(default_value = "")]
        query: String,

        /// Restrict results to one category.
        #[arg(short, long)]
        category: Option<TaskCategory>,
    },

    /// List task categories with counts from the public index.
    Categories,

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays
/// valid JSON.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "taskdocs=info",
        1 => "taskdocs=debug",
        _ => "taskdocs=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Get { identifier } => {
            let resolver = resolver(&config, cli.no_inventory)?;
            emit(resolver.get_task(&identifier).await)
        }
        Command::Search { query, category } => {
            let resolver = resolver(&config, cli.no_inventory)?;
            emit(resolver.search_tasks(&query, category).await)
        }
        Command::Categories => {
            let resolver = resolver(&config, true)?;
            emit(resolver.list_categories().await)
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

fn resolver(config: &AppConfig, no_inventory: bool) -> Result<Resolver> {
    let mut resolver = Resolver::from_config(config)?;
    if no_inventory {
        debug!("inventory disabled by flag");
        resolver = resolver.without_inventory();
    }
    Ok(resolver)
}

/// Print a result or its error payload as pretty JSON on stdout.
fn emit<T: Serialize>(result: std::result::Result<T, TaskDocsError>) -> Result<ExitCode> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: taskdocs_shared::ErrorPayload,
            }
            let output = ErrorOutput {
                error: err.to_payload(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn cmd_config_init() -> Result<ExitCode> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn cmd_config_show(config: &AppConfig) -> Result<ExitCode> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn search_parses_category() {
        let cli = Cli::try_parse_from(["taskdocs", "search", "dotnet", "--category", "Build"])
            .expect("parse");
        match cli.command {
            Command::Search { query, category } => {
                assert_eq!(query, "dotnet");
                assert_eq!(category, Some(TaskCategory::Build));
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn search_query_defaults_to_empty() {
        let cli = Cli::try_parse_from(["taskdocs", "search"]).expect("parse");
        assert!(matches!(
            cli.command,
            Command::Search { ref query, category: None } if query.is_empty()
        ));
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(Cli::try_parse_from(["taskdocs", "search", "x", "--category", "nope"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["taskdocs", "get", "Bash@3", "--no-inventory", "-vv"])
            .expect("parse");
        assert!(cli.no_inventory);
        assert_eq!(cli.verbose, 2);
    }
}
