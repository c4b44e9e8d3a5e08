//! Toodledo MCP - Model Context Protocol server for Toodledo
//!
//! Exposes Toodledo tasks, folders, contexts, goals and locations as MCP
//! tools over stdio, with a small CLI for authorization and quick lookups.

mod api;
mod auth;
mod config;
mod error;
mod mcp;
mod models;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{Completion, TaskQuery, ToodledoClient};
use crate::auth::{AuthConfig, CredentialStore, TokenManager};
use crate::config::Settings;
use crate::mcp::ToolGateway;
use crate::models::{parse_due_date, validate_priority, NewTask};

#[derive(Parser)]
#[command(name = "toodledo-mcp")]
#[command(about = "MCP server and CLI for Toodledo", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Alternative TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server on stdio
    Serve,

    /// Print the authorization URL and next steps
    AuthUrl,

    /// Exchange an authorization code for tokens
    Authorize {
        /// The `code` parameter from the callback URL
        code: String,
    },

    /// Show current token status
    Status,

    /// Show current user info (verify auth works)
    Whoami,

    /// List tasks
    Tasks {
        /// Completion filter
        #[arg(short, long, value_enum, default_value = "incomplete")]
        status: Completion,

        /// Only starred tasks
        #[arg(long)]
        starred: bool,

        /// Maximum number of tasks to show
        #[arg(
            short,
            long,
            default_value = "20",
            value_parser = clap::value_parser!(u32).range(1..=1000)
        )]
        limit: u32,

        /// Skip this many tasks
        #[arg(long, default_value = "0")]
        offset: u32,

        /// Only tasks modified after this Unix timestamp
        #[arg(long)]
        after: Option<i64>,

        /// Only tasks modified before this Unix timestamp
        #[arg(long)]
        before: Option<i64>,
    },

    /// Starred "Next Action" tasks
    HotList,

    /// Create a task
    Add {
        title: String,

        /// Folder ID
        #[arg(long)]
        folder: Option<i64>,

        /// Context ID
        #[arg(long)]
        context: Option<i64>,

        /// -1 negative, 0 low, 1 medium, 2 high, 3 top
        #[arg(short, long, allow_negative_numbers = true)]
        priority: Option<i64>,

        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        due: Option<String>,

        #[arg(short, long)]
        note: Option<String>,

        /// Star the task
        #[arg(long)]
        star: bool,
    },

    /// Mark a task completed
    Complete { id: i64 },

    /// Delete a task
    Delete { id: i64 },

    /// Force an access token refresh
    Refresh,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout belongs to the MCP stream; logs go to stderr
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let tokens = TokenManager::new(
        AuthConfig::from_settings(&settings)?,
        CredentialStore::new(&settings.token_storage_path),
    )?;
    let client = ToodledoClient::new(settings.base_url(), tokens.clone())?;

    match cli.command {
        Commands::Serve => {
            if !tokens.has_valid_credentials() {
                tracing::warn!("No stored tokens; call health_check for authorization steps");
            }
            mcp::serve(ToolGateway::new(client)).await?;
        }
        Commands::AuthUrl => {
            auth::print_authorization_steps(&tokens);
        }
        Commands::Authorize { code } => {
            api::authorize(&client, &code).await?;
        }
        Commands::Status => {
            auth::status(&tokens);
        }
        Commands::Whoami => {
            api::whoami(&client).await?;
        }
        Commands::Tasks {
            status,
            starred,
            limit,
            offset,
            after,
            before,
        } => {
            tracing::info!("Fetching tasks...");
            let query = TaskQuery {
                completion: status,
                before,
                after,
                start: offset,
                num: limit,
            };
            api::list_tasks(&client, query, starred).await?;
        }
        Commands::HotList => {
            api::hot_list(&client).await?;
        }
        Commands::Add {
            title,
            folder,
            context,
            priority,
            due,
            note,
            star,
        } => {
            let task = NewTask {
                folder,
                context,
                priority: priority.map(validate_priority).transpose()?,
                duedate: due.as_deref().map(parse_due_date).transpose()?,
                note,
                star: star.then_some(1),
                ..NewTask::titled(title)
            };
            api::add_task(&client, task).await?;
        }
        Commands::Complete { id } => {
            api::complete_task(&client, id).await?;
        }
        Commands::Delete { id } => {
            api::delete_task(&client, id).await?;
        }
        Commands::Refresh => {
            api::refresh(&client).await?;
        }
    }

    Ok(())
}
