//! Status command - show configuration and status

use anyhow::Result;
use console::style;
use greenleaf_server::config::ServerConfig;

pub async fn show(config: &ServerConfig) -> Result<()> {
    println!(
        "\n{}",
        style("╔════════════════════════════════════════╗").green()
    );
    println!(
        "{}",
        style("║   🌿 Green Leaf Status                 ║").green()
    );
    println!(
        "{}",
        style("╚════════════════════════════════════════╝").green()
    );
    println!();

    // Version info
    println!("{}", style("Version").bold().underlined());
    println!("  greenleaf-cli:   {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("{}", style("Authentication").bold().underlined());
    let strategy = config.strategy()?;
    println!("  Strategy:        {}", style(strategy.as_str()).cyan());
    if let Some(project) = &config.firebase_project_id {
        println!("  Firebase:        {}", project);
    }
    println!("  Session TTL:     {} days", config.session_ttl_days);
    println!("  Reset token TTL: {} s", config.reset_token_ttl_secs);
    println!(
        "  Mail:            {}",
        match &config.smtp_host {
            Some(host) => style(format!("SMTP via {}", host)).green(),
            None => style("log only (no SMTP host)".to_string()).yellow(),
        }
    );
    println!();

    println!("{}", style("Storage").bold().underlined());
    println!(
        "  Database:        {}",
        if config.database_url.is_some() {
            style("PostgreSQL").green()
        } else {
            style("Not set (using in-memory)").yellow()
        }
    );
    println!();

    println!("{}", style("Uploads").bold().underlined());
    let configured = |value: &Option<String>| {
        if value.as_deref().map_or(false, |v| !v.trim().is_empty()) {
            style("configured").green()
        } else {
            style("not configured").dim()
        }
    };
    println!("  Imgur:           {}", configured(&config.imgur_client_id));
    println!("  ImgBB:           {}", configured(&config.imgbb_api_key));
    println!(
        "  Temporary store: {}",
        match &config.temp_upload_dir {
            Some(dir) => style(dir.display().to_string()).yellow(),
            None => style("disabled".to_string()).dim(),
        }
    );
    println!(
        "  Limits:          {} MB, {}*",
        config.max_upload_mb, config.allowed_mime_prefix
    );
    println!();

    // Effective configuration, secrets masked
    println!("{}", style("Effective Configuration").bold().underlined());
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    println!();

    // Quick help
    println!("{}", style("Quick Start").bold().underlined());
    println!("  Start server:    greenleaf serve");
    println!("  Migrate:         greenleaf db migrate");
    println!("  Create admin:    greenleaf user create -e admin@example.com -n Admin -r admin");
    println!("  Show help:       greenleaf --help");

    Ok(())
}
