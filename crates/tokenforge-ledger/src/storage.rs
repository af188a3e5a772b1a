//! # Snapshot Storage
//!
//! Persists [`LedgerSnapshot`]s between process runs.
//!
//! ## Encoding
//!
//! ```text
//! ┌──────────────────────────────┬────────────────────────┐
//! │ bincode(LedgerSnapshot)      │ blake3(payload) 32 B   │
//! └──────────────────────────────┴────────────────────────┘
//! ```
//!
//! The checksum trailer catches truncated or corrupted files before
//! deserialization. Restored state is then validated by
//! [`TokenForge::from_snapshot`](crate::TokenForge::from_snapshot).

use crate::snapshot::LedgerSnapshot;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokenforge_core::LedgerError;

const CHECKSUM_LENGTH: usize = 32;

/// Failures while reading or writing snapshots
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot encoding failed: {0}")]
    Encode(String),

    #[error("Snapshot decoding failed: {0}")]
    Decode(String),

    #[error("Snapshot checksum mismatch")]
    ChecksumMismatch,

    #[error("Snapshot is {0} bytes, too short to hold a checksum")]
    Truncated(usize),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io { .. } => LedgerError::Storage(err.to_string()),
            _ => LedgerError::Serialization(err.to_string()),
        }
    }
}

/// Encode a snapshot with its checksum trailer
pub fn encode(snapshot: &LedgerSnapshot) -> Result<Vec<u8>, StoreError> {
    let mut bytes = bincode::serialize(snapshot).map_err(|e| StoreError::Encode(e.to_string()))?;
    let checksum = blake3::hash(&bytes);
    bytes.extend_from_slice(checksum.as_bytes());
    Ok(bytes)
}

/// Verify the checksum trailer and decode the snapshot
pub fn decode(bytes: &[u8]) -> Result<LedgerSnapshot, StoreError> {
    if bytes.len() < CHECKSUM_LENGTH {
        return Err(StoreError::Truncated(bytes.len()));
    }
    let (payload, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LENGTH);
    if blake3::hash(payload).as_bytes() != checksum {
        return Err(StoreError::ChecksumMismatch);
    }
    bincode::deserialize(payload).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Where a ledger's snapshot lives
pub trait SnapshotStore: Send + Sync {
    /// Latest saved snapshot, `None` if nothing was saved yet
    fn load(&self) -> Result<Option<LedgerSnapshot>, StoreError>;

    /// Replace the saved snapshot
    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), StoreError>;
}

/// Single-file store with atomic replace
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

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> Result<Option<LedgerSnapshot>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let snapshot = decode(&bytes)?;
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot loaded");
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), StoreError> {
        let bytes = encode(snapshot)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        // Write atomically
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, &bytes).map_err(|e| self.io_error(e))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot saved");
        Ok(())
    }
}

/// In-memory store holding the encoded bytes
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Option<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<LedgerSnapshot>, StoreError> {
        self.data.read().as_deref().map(decode).transpose()
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), StoreError> {
        *self.data.write() = Some(encode(snapshot)?);
        Ok(())
    }
}
