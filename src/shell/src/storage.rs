use anyhow::{Context, Result};
use log::{debug, warn};
use softpos_demo_core::{StorageOperation, StorageOutput};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Client-local key-value storage in a JSON object file
///
/// A missing file is empty storage. Every write rewrites the whole file.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn entries(&self) -> Result<BTreeMap<String, String>> {
        if !fs::try_exists(&self.path)
            .await
            .context("failed to check if storage file exists")?
        {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .context(format!("failed to read {}", self.path.display()))?;

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).context(format!("failed to parse {}", self.path.display()))
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().await?.remove(key))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write(&entries).await
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries().await?;
        if entries.remove(key).is_some() {
            self.write(&entries).await?;
        }
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        if fs::try_exists(&self.path)
            .await
            .context("failed to check if storage file exists")?
        {
            fs::remove_file(&self.path)
                .await
                .context(format!("failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }

    /// Perform a storage effect of the core
    pub async fn execute(&self, operation: StorageOperation) -> StorageOutput {
        debug!("storage {operation:?}");

        let result = match operation {
            StorageOperation::Get { key } => self
                .get(&key)
                .await
                .map(|value| StorageOutput::Value { value }),
            StorageOperation::Set { key, value } => {
                self.set(&key, &value).await.map(|_| StorageOutput::Done)
            }
            StorageOperation::Remove { key } => {
                self.remove(&key).await.map(|_| StorageOutput::Done)
            }
        };

        result.unwrap_or_else(|e| {
            warn!("storage operation failed: {e:#}");
            StorageOutput::Error {
                message: format!("{e:#}"),
            }
        })
    }

    async fn write(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context(format!("failed to create {}", parent.display()))?;
        }

        let content =
            serde_json::to_string_pretty(entries).context("failed to serialize storage")?;

        fs::write(&self.path, content)
            .await
            .context(format!("failed to write {}", self.path.display()))
    }
}
