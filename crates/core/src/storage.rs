//! Durable string key/value storage kept in the data directory.
//!
//! Every write is flushed synchronously; reads always go back to disk so that
//! several handles over the same file never hold diverging copies.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::config::AppConfig;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const BACKGROUND_KEY: &str = "background";

#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn open(config: &AppConfig) -> Self {
        Self::at(config.storage_path())
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.read_entries()?;
        Ok(entries.remove(key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let (mut entries, _) = self.entries_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let (mut entries, discarded) = self.entries_for_write()?;
        if entries.remove(key).is_some() || discarded {
            self.write_entries(&entries)?;
        }
        Ok(())
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        match self.read_raw()? {
            Some(raw) => self.parse(&raw),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Like `read_entries`, but unparsable contents are dropped so the next
    /// write replaces them. The flag reports whether anything was dropped.
    fn entries_for_write(&self) -> Result<(BTreeMap<String, String>, bool)> {
        let Some(raw) = self.read_raw()? else {
            return Ok((BTreeMap::new(), false));
        };
        match self.parse(&raw) {
            Ok(entries) => Ok((entries, false)),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "storage is not valid JSON; rewriting it from an empty map"
                );
                Ok((BTreeMap::new(), true))
            }
        }
    }

    fn read_raw(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage at {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(raw))
    }

    fn parse(&self, raw: &str) -> Result<BTreeMap<String, String>> {
        serde_json::from_str(raw)
            .with_context(|| format!("Storage at {} is not valid JSON", self.path.display()))
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create storage directory {}", parent.display())
            })?;
        }
        let encoded = serde_json::to_string_pretty(entries)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded)
            .with_context(|| format!("Failed to write storage at {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("Failed to replace storage at {}", self.path.display()))?;
        Ok(())
    }
}
