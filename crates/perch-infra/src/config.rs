//! Configuration file loader for Perch.
//!
//! Reads `perch.toml` and deserializes it into [`PerchConfig`]. Unlike most
//! settings files a missing or malformed config is fatal: every agent needs
//! its own username before the run loop may start.

use std::path::{Path, PathBuf};

use perch_types::config::PerchConfig;
use perch_types::error::ConfigError;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PERCH_CONFIG";

/// Resolve the config file path.
///
/// Priority:
/// 1. An explicit path (the `--config` flag)
/// 2. The `PERCH_CONFIG` environment variable
/// 3. `~/.perch/perch.toml`
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".perch").join("perch.toml");
    }

    PathBuf::from("perch.toml")
}

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<PerchConfig, ConfigError> {
    let config: PerchConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Load and validate the config at `path`.
pub async fn load_config(path: &Path) -> Result<PerchConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;

    let config = parse_config(&content)?;
    tracing::debug!(
        path = %path.display(),
        agents = config.agents.len(),
        "loaded config"
    );
    Ok(config)
}
