//! Providers command - checks each configured upload provider

use anyhow::Result;
use console::style;
use greenleaf_server::config::ServerConfig;

pub async fn check(config: &ServerConfig) -> Result<()> {
    let uploader = config.upload_config().build_uploader()?;

    let names = uploader.provider_names();
    if names.is_empty() {
        println!("{}", style("No hosted providers configured.").yellow());
    } else {
        println!("Fallback order: {}", names.join(" → "));
    }
    println!();

    for status in uploader.provider_status().await {
        println!(
            "  {:<12} {}",
            status.provider,
            if status.available {
                style("available").green()
            } else {
                style("unavailable").red()
            }
        );
    }

    Ok(())
}
