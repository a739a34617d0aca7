//! CLI command implementations

pub mod db;
pub mod providers;
pub mod server;
pub mod status;
pub mod upload;
pub mod user;

use std::path::Path;

use anyhow::Result;
use greenleaf_server::config::ServerConfig;

/// Load the server configuration, from `path` when given
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig> {
    Ok(ServerConfig::load_from(path)?)
}
