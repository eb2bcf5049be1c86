use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use tqa_core::domain::Document;
use tqa_core::error::AppError;

use super::{Bm25Params, LexicalIndex};

/// Freshness record for a persisted index snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotStatus {
    pub ready: bool,
    pub doc_count: u32,
    pub corpus_sha256: Option<String>,
    pub params: Option<Bm25Params>,
    pub built_at: Option<String>,
}

impl SnapshotStatus {
    fn not_ready() -> Self {
        Self {
            ready: false,
            doc_count: 0,
            corpus_sha256: None,
            params: None,
            built_at: None,
        }
    }
}

/// On-disk snapshot of a built index plus its document set, so a restart can
/// skip the corpus rebuild. A snapshot whose corpus fingerprint no longer
/// matches the corpus file is stale and must be rebuilt, never served.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn status_path(&self) -> PathBuf {
        self.root.join("status.json")
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn documents_path(&self) -> PathBuf {
        self.root.join("documents.json")
    }

    fn ensure_dirs(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.root.as_path()).map_err(|e| {
            AppError::new("SNAPSHOT_WRITE_FAILED", "Failed to create snapshot directory")
                .with_details(format!("path={}; err={}", self.root.display(), e))
        })
    }

    pub fn status(&self) -> Result<SnapshotStatus, AppError> {
        let path = self.status_path();
        if !path.exists() {
            return Ok(SnapshotStatus::not_ready());
        }
        let bytes = fs::read(&path).map_err(|e| {
            AppError::new("SNAPSHOT_READ_FAILED", "Failed to read snapshot status")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::new("SNAPSHOT_READ_FAILED", "Failed to decode snapshot status")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    /// Persist a built index and its documents atomically (tmp + rename per
    /// file; status last, so a torn write never reads as ready).
    pub fn save(
        &self,
        index: &LexicalIndex,
        documents: &[Document],
        corpus_sha256: &str,
        built_at: &str,
    ) -> Result<SnapshotStatus, AppError> {
        if index.len() != documents.len() {
            return Err(AppError::new(
                "SNAPSHOT_WRITE_FAILED",
                "Index and document set disagree on document count",
            )
            .with_details(format!(
                "index={}; documents={}",
                index.len(),
                documents.len()
            )));
        }

        self.ensure_dirs()?;
        self.write_json(&self.index_path(), index, "snapshot index")?;
        self.write_json(&self.documents_path(), &documents, "snapshot documents")?;

        let status = SnapshotStatus {
            ready: true,
            doc_count: documents.len() as u32,
            corpus_sha256: Some(corpus_sha256.to_string()),
            params: Some(index.params()),
            built_at: Some(built_at.to_string()),
        };
        self.write_json(&self.status_path(), &status, "snapshot status")?;

        info!(docs = documents.len(), root = %self.root.display(), "saved index snapshot");
        Ok(status)
    }

    /// Load a ready snapshot, verifying it against the current corpus
    /// fingerprint. A stale snapshot is an error so callers rebuild instead
    /// of serving scores from outdated state.
    pub fn load_fresh(
        &self,
        corpus_sha256: &str,
    ) -> Result<(LexicalIndex, Vec<Document>), AppError> {
        let status = self.status()?;
        if !status.ready {
            return Err(AppError::new(
                "SNAPSHOT_NOT_READY",
                "No snapshot available; build the index first",
            ));
        }
        if status.corpus_sha256.as_deref() != Some(corpus_sha256) {
            return Err(AppError::new(
                "SNAPSHOT_STALE",
                "Snapshot was built from a different corpus; rebuild required",
            )
            .with_details(format!(
                "snapshot={}; corpus={corpus_sha256}",
                status.corpus_sha256.as_deref().unwrap_or("none")
            )));
        }

        let index: LexicalIndex = self.read_json(&self.index_path(), "snapshot index")?;
        let documents: Vec<Document> = self.read_json(&self.documents_path(), "snapshot documents")?;
        if index.len() != documents.len() {
            return Err(AppError::new(
                "SNAPSHOT_READ_FAILED",
                "Snapshot index and document set disagree on document count",
            )
            .with_details(format!(
                "index={}; documents={}",
                index.len(),
                documents.len()
            )));
        }
        Ok((index, documents))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T, what: &str) -> Result<(), AppError> {
        let tmp = path.with_extension("tmp");
        let json = serde_json::to_string_pretty(value).map_err(|e| {
            AppError::new("SNAPSHOT_WRITE_FAILED", format!("Failed to encode {what}"))
                .with_details(e.to_string())
        })?;
        fs::write(&tmp, json.as_bytes()).map_err(|e| {
            AppError::new("SNAPSHOT_WRITE_FAILED", format!("Failed to write {what}"))
                .with_details(format!("path={}; err={}", tmp.display(), e))
        })?;
        fs::rename(&tmp, path).map_err(|e| {
            AppError::new("SNAPSHOT_WRITE_FAILED", format!("Failed to finalize {what} write"))
                .with_details(format!(
                    "tmp={}; dest={}; err={}",
                    tmp.display(),
                    path.display(),
                    e
                ))
        })?;
        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &Path,
        what: &str,
    ) -> Result<T, AppError> {
        let bytes = fs::read(path).map_err(|e| {
            AppError::new("SNAPSHOT_READ_FAILED", format!("Failed to read {what}"))
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::new("SNAPSHOT_READ_FAILED", format!("Failed to decode {what}"))
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }
}
