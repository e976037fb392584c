// src/storage/local.rs

//! Local filesystem storage implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{JobCountReport, RulesDocument};
use crate::storage::{DocumentStorage, WriteMetadata};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Pretty-printed JSON with a trailing newline.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(value)?;
        bytes.push(b'\n');
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DocumentStorage for LocalStorage {
    async fn load_rules(&self, key: &str) -> Result<RulesDocument> {
        let value: serde_json::Value = self.read_json(key).await?.ok_or_else(|| {
            AppError::config(format!(
                "rules document not found: {}",
                self.path(key).display()
            ))
        })?;
        RulesDocument::from_value(value)
    }

    async fn save_rules(&self, key: &str, document: &RulesDocument) -> Result<()> {
        self.write_json(key, document.as_value()).await?;
        log::debug!("Rules document written to {}", self.path(key).display());
        Ok(())
    }

    async fn load_report(&self, key: &str) -> Result<Option<JobCountReport>> {
        self.read_json(key).await
    }

    async fn write_report(&self, key: &str, report: &JobCountReport) -> Result<WriteMetadata> {
        self.write_json(key, report).await?;
        Ok(WriteMetadata {
            location: self.path(key).display().to_string(),
            entry_count: report.per_poa.len(),
            timestamp: Utc::now(),
        })
    }
}
