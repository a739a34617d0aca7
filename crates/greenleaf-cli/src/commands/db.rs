//! Database management commands

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use console::style;
use greenleaf_db::DatabasePool;
use greenleaf_server::config::ServerConfig;

async fn connect(config: &ServerConfig) -> Result<DatabasePool> {
    let db_config = config
        .database_config()
        .context("database_url is not configured")?;

    println!("Connecting to database...");
    DatabasePool::connect(&db_config).await.map_err(|e| anyhow!(e))
}

/// Run database migrations
pub async fn migrate(config: &ServerConfig) -> Result<()> {
    let pool = connect(config).await?;

    println!("Running migrations...");
    pool.migrate().await.map_err(|e| anyhow!(e))?;

    println!("{}", style("Migrations completed successfully.").green());
    pool.close().await;
    Ok(())
}

/// Show database status
pub async fn status(config: &ServerConfig) -> Result<()> {
    let pool = match connect(config).await {
        Ok(pool) => pool,
        Err(e) => {
            println!("Failed to connect: {}", style(e).red());
            return Ok(());
        }
    };

    match pool.status().await {
        Ok(status) => {
            println!("Database: {}", style("connected").green());
            println!(
                "Pool: {} connection(s), {} idle",
                status.connections, status.idle_connections
            );
            println!("\nTable counts:");
            println!("  users: {}", status.users);
            println!("  password_reset_tokens: {}", status.reset_tokens);
        }
        Err(e) => {
            println!("Database: {} - {}", style("error").red(), e);
            println!("Run `greenleaf db migrate` if the tables are missing.");
        }
    }

    pool.close().await;
    Ok(())
}

/// Delete reset tokens that are used or past their expiry
pub async fn purge_reset_tokens(config: &ServerConfig) -> Result<()> {
    let pool = connect(config).await?;
    let removed = pool
        .reset_tokens()
        .cleanup_expired(Utc::now())
        .await
        .map_err(|e| anyhow!(e))?;

    println!("Removed {} reset token(s).", style(removed).bold());
    pool.close().await;
    Ok(())
}
