//! Green Leaf CLI
//!
//! Command-line interface for running and administering a Green Leaf server.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "greenleaf")]
#[command(author, version, about = "Green Leaf: accounts and image uploads for crop diagnosis", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./greenleaf.toml when present)
    #[arg(short, long, global = true, env = "GREENLEAF_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Green Leaf server
    Serve {
        /// Address to bind to, overriding the configuration
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Database maintenance
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Check which upload providers are reachable
    Providers,

    /// Upload images through the provider chain
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show configuration and status
    Status,
}

#[derive(Subcommand)]
enum DbAction {
    /// Run pending migrations
    Migrate,

    /// Show connection health and row counts
    Status,

    /// Delete used and expired password-reset tokens
    PurgeResetTokens,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account with any role
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (farmer, researcher, admin)
        #[arg(short, long, default_value = "farmer")]
        role: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                format!(
                    "greenleaf={0},greenleaf_server={0},greenleaf_upload={0}",
                    log_level
                )
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind } => {
            commands::server::run(config, bind).await?;
        }
        Commands::Db { action } => match action {
            DbAction::Migrate => commands::db::migrate(&config).await?,
            DbAction::Status => commands::db::status(&config).await?,
            DbAction::PurgeResetTokens => commands::db::purge_reset_tokens(&config).await?,
        },
        Commands::User { action } => match action {
            UserAction::Create { email, name, role } => {
                commands::user::create(config, email, name, &role).await?;
            }
        },
        Commands::Providers => {
            commands::providers::check(&config).await?;
        }
        Commands::Upload { files } => {
            commands::upload::run(&config, &files).await?;
        }
        Commands::Status => {
            commands::status::show(&config).await?;
        }
    }

    Ok(())
}
