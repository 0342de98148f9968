//! Key-value store persisted as a JSON document on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{CacheError, KeyValueStore};

type Document = BTreeMap<String, String>;

/// Durable key-value store backed by a single JSON object file.
///
/// The document is read lazily on first access and kept in memory. Every
/// `set` rewrites the whole file through a sibling temp file and a rename,
/// so a crash mid-write leaves the previous document intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    doc: Mutex<Option<Document>>,
}

impl FileStore {
    /// Create a store at `path`. The file is created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            doc: Mutex::new(None),
        }
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Document, CacheError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Document::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store file missing, starting empty");
                Ok(Document::new())
            }
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn write(&self, doc: &Document) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let bytes = serde_json::to_vec_pretty(doc)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }

    /// Sibling of the document named `<file name>.tmp`.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> CacheError {
        CacheError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut guard = self.doc.lock().await;
        if guard.is_none() {
            *guard = Some(self.load().await?);
        }
        Ok(guard.as_ref().and_then(|doc| doc.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut guard = self.doc.lock().await;
        let mut doc = match guard.take() {
            Some(doc) => doc,
            None => self.load().await?,
        };
        doc.insert(key.to_string(), value.to_string());

        // Keep the in-memory copy only once the file reflects it.
        let result = self.write(&doc).await;
        if result.is_ok() {
            *guard = Some(doc);
        }
        result
    }
}
