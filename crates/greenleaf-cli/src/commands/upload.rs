//! Upload command - pushes local files through the provider chain

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use greenleaf_core::UploadResult;
use greenleaf_server::config::ServerConfig;
use greenleaf_upload::{UploadFile, UploadLedger};
use indicatif::{ProgressBar, ProgressStyle};

/// Content type from the file extension; unknown types are sent as
/// `application/octet-stream` and rejected by validation
fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

pub async fn run(config: &ServerConfig, files: &[PathBuf]) -> Result<()> {
    let uploader = config.upload_config().build_uploader()?;
    let mut ledger = UploadLedger::new();

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.green/white}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        pb.set_message(name.clone());

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let file = UploadFile::new(name.clone(), content_type_for(path), bytes);

        let result = match uploader.upload(&file).await {
            Ok(result) => result,
            Err(e) => UploadResult::failed(None, e.to_string()),
        };
        let attempt = ledger.add_upload(&name, file.size(), &result);

        let line = match (&attempt.url, &attempt.error) {
            (Some(url), _) if attempt.is_temporary => {
                format!("{} {} → {} (temporary)", style("~").yellow(), name, url)
            }
            (Some(url), _) => format!("{} {} → {}", style("✓").green(), name, url),
            (None, error) => format!(
                "{} {} ({} MB): {}",
                style("✗").red(),
                name,
                attempt.size_mb,
                error.as_deref().unwrap_or("failed")
            ),
        };
        pb.println(line);
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    let stats = ledger.stats();
    println!();
    println!(
        "{} uploaded, {} failed ({}% success)",
        style(stats.successful).green(),
        style(stats.failed).red(),
        stats.success_rate
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(content_type_for(Path::new("leaf.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a/b/leaf.png")), "image/png");
        assert_eq!(content_type_for(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(content_type_for(Path::new("README")), "application/octet-stream");
    }
}
