//! User management commands

use anyhow::{anyhow, bail, Result};
use console::style;
use dialoguer::Password;
use greenleaf_auth::Registration;
use greenleaf_core::Role;
use greenleaf_server::config::ServerConfig;
use greenleaf_server::state::AppState;

/// Create an account directly in the database.
///
/// This is the only way to create admins; self-registration stops at the
/// lower roles.
pub async fn create(config: ServerConfig, email: String, name: String, role: &str) -> Result<()> {
    let role: Role = role.parse().map_err(|e: String| anyhow!(e))?;
    if config.database_url.is_none() {
        bail!("database_url is not configured; an in-memory account would vanish on exit");
    }

    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;

    let state = AppState::from_config(config).await?;
    let outcome = state
        .accounts
        .register(Registration {
            name,
            email,
            password,
            role,
            location: None,
        })
        .await?;

    println!(
        "{} {} <{}> as {}",
        style("Created").green().bold(),
        outcome.user.name,
        outcome.user.email,
        style(outcome.user.role.as_str()).cyan()
    );
    println!("  id: {}", outcome.user.id);

    if let Some(db) = &state.db {
        db.close().await;
    }
    Ok(())
}
