//! Blacklist file: one username per line, reloaded on every maintenance run.
//!
//! Blank lines and `#` comments are skipped; a leading `@` is allowed.

use std::path::{Path, PathBuf};

use perch_core::maintenance::BlacklistSource;
use perch_types::error::SourceError;

/// Usernames listed in `content`.
pub fn parse_blacklist(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.trim_start_matches('@').to_string())
        .collect()
}

/// A blacklist stored in a local text file.
#[derive(Debug, Clone)]
pub struct BlacklistFile {
    path: PathBuf,
}

impl BlacklistFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlacklistSource for BlacklistFile {
    async fn load(&self) -> Result<Vec<String>, SourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Io(format!("{}: {e}", self.path.display())))?;
        Ok(parse_blacklist(&content))
    }
}
