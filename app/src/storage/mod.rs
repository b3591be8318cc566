// order-relay/src/storage/mod.rs

//! Durable object storage used by the reservation consumer.
//!
//! The consumer only sees the [`BlobStore`] trait. `memory:` keeps objects in process
//! (tests, local runs); `file://<root>` writes one directory per container.

pub mod fs;
pub mod memory;

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

/// Metadata read back after an upload to confirm it landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobProperties {
  pub content_type: String,
  pub content_length: u64,
  pub last_modified: DateTime<Utc>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
  /// Creates the container if it is absent. Returns `true` when this call created it.
  async fn ensure_container(&self, container: &str) -> Result<bool>;

  async fn exists(&self, container: &str) -> Result<bool>;

  async fn put(&self, container: &str, key: &str, bytes: &[u8], content_type: &str) -> Result<()>;

  async fn properties(&self, container: &str, key: &str) -> Result<Option<BlobProperties>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobStoreConfig {
  Memory,
  FileSystem { root: PathBuf },
}

impl BlobStoreConfig {
  /// Accepts `memory:`, `file://<path>` or a bare filesystem path.
  pub fn parse(connection: &str) -> Result<Self> {
    let connection = connection.trim();
    if connection.is_empty() {
      return Err(AppError::Config("STORAGE_CONNECTION is empty".to_string()));
    }
    if connection.eq_ignore_ascii_case("memory:") || connection.eq_ignore_ascii_case("memory") {
      return Ok(BlobStoreConfig::Memory);
    }
    let path = connection.strip_prefix("file://").unwrap_or(connection);
    if path.is_empty() {
      return Err(AppError::Config(format!("STORAGE_CONNECTION '{}' has no path", connection)));
    }
    Ok(BlobStoreConfig::FileSystem { root: PathBuf::from(path) })
  }

  pub fn build(&self) -> Arc<dyn BlobStore> {
    match self {
      BlobStoreConfig::Memory => Arc::new(MemoryBlobStore::new()),
      BlobStoreConfig::FileSystem { root } => Arc::new(FsBlobStore::new(root.clone())),
    }
  }
}

/// Keys and container names end up as path segments in the filesystem store, so both
/// are limited to a conservative character set everywhere.
pub(crate) fn validate_name(kind: &str, name: &str) -> Result<()> {
  let valid = !name.is_empty()
    && name.len() <= 255
    && name != "."
    && name != ".."
    && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
  if valid {
    Ok(())
  } else {
    Err(AppError::TransientStorage(format!("invalid {} name '{}'", kind, name)))
  }
}
