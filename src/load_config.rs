use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;

/// Loads a static YAML config file (no secrets) and injects the optional
/// `GITHUB_TOKEN` from the environment. Returns a fully merged Config.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    info!(config_path = ?path, "Loading configuration from file");

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let mut config: Config = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse config YAML {}", path.display()))?;

    config.token = match std::env::var("GITHUB_TOKEN") {
        Ok(token) if !token.is_empty() => {
            info!("GITHUB_TOKEN found in env, requests will be authenticated");
            Some(token)
        }
        _ => {
            info!("No GITHUB_TOKEN in env, using unauthenticated requests");
            None
        }
    };

    config.trace_loaded();
    Ok(config)
}
