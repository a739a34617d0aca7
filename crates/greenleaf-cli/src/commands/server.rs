//! Serve command - runs the Green Leaf HTTP server

use anyhow::Result;
use console::style;
use greenleaf_server::config::ServerConfig;

pub async fn run(mut config: ServerConfig, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.bind = bind;
    }

    println!(
        "\n{}",
        style("╔════════════════════════════════════════╗").green()
    );
    println!(
        "{}",
        style("║   🌿 Green Leaf Server                 ║").green()
    );
    println!(
        "{}",
        style("╚════════════════════════════════════════╝").green()
    );
    println!();

    println!("Binding to:      {}", style(&config.bind).green());
    println!("Public URL:      {}", config.public_url);
    println!("Auth strategy:   {}", config.strategy()?.as_str());
    println!(
        "Storage:         {}",
        if config.database_url.is_some() {
            style("PostgreSQL").green()
        } else {
            style("in-memory (data is lost on restart)").yellow()
        }
    );
    println!();

    println!("{}", style("Endpoints:").bold());
    println!("  Health:        {}/health", config.public_url);
    println!("  Sessions:      {}/auth/{{register,login,logout,me}}", config.public_url);
    println!("  Resets:        {}/auth/forgot-password", config.public_url);
    println!("  Uploads:       {}/uploads", config.public_url);
    println!();

    greenleaf_server::serve(config).await
}
