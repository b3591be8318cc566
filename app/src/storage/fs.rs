// order-relay/src/storage/fs.rs

use super::{validate_name, BlobProperties, BlobStore};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument};

const PROPERTIES_SUFFIX: &str = ".properties.json";

/// Filesystem-backed store: `<root>/<container>/<key>` holds the bytes and
/// `<key>.properties.json` next to it holds the [`BlobProperties`].
#[derive(Debug, Clone)]
pub struct FsBlobStore {
  root: PathBuf,
}

impl FsBlobStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  fn container_path(&self, container: &str) -> PathBuf {
    self.root.join(container)
  }

  fn properties_path(&self, container: &str, key: &str) -> PathBuf {
    self.container_path(container).join(format!("{}{}", key, PROPERTIES_SUFFIX))
  }
}

fn storage_err(action: &str, path: &Path, err: std::io::Error) -> AppError {
  AppError::TransientStorage(format!("{} '{}' failed: {}", action, path.display(), err))
}

/// Writes through a temporary sibling and renames it into place so readers never see
/// a half-written file.
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
  let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
  fs::write(&tmp, bytes).await.map_err(|e| storage_err("write", &tmp, e))?;
  fs::rename(&tmp, path).await.map_err(|e| storage_err("rename", path, e))
}

#[async_trait]
impl BlobStore for FsBlobStore {
  #[instrument(skip(self), fields(root = %self.root.display()))]
  async fn ensure_container(&self, container: &str) -> Result<bool> {
    validate_name("container", container)?;
    let path = self.container_path(container);
    match fs::metadata(&path).await {
      Ok(meta) if meta.is_dir() => return Ok(false),
      Ok(_) => {
        return Err(AppError::TransientStorage(format!(
          "'{}' exists and is not a directory",
          path.display()
        )))
      }
      Err(e) if e.kind() == ErrorKind::NotFound => {}
      Err(e) => return Err(storage_err("stat", &path, e)),
    }
    fs::create_dir_all(&path).await.map_err(|e| storage_err("create", &path, e))?;
    debug!("container directory created");
    Ok(true)
  }

  async fn exists(&self, container: &str) -> Result<bool> {
    validate_name("container", container)?;
    let path = self.container_path(container);
    match fs::metadata(&path).await {
      Ok(meta) => Ok(meta.is_dir()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
      Err(e) => Err(storage_err("stat", &path, e)),
    }
  }

  #[instrument(skip(self, bytes), fields(size = bytes.len()))]
  async fn put(&self, container: &str, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
    validate_name("container", container)?;
    validate_name("key", key)?;
    if !self.exists(container).await? {
      return Err(AppError::TransientStorage(format!("container '{}' does not exist", container)));
    }

    let object_path = self.container_path(container).join(key);
    write_atomically(&object_path, bytes).await?;

    let properties = BlobProperties {
      content_type: content_type.to_string(),
      content_length: bytes.len() as u64,
      last_modified: Utc::now(),
    };
    let sidecar = serde_json::to_vec(&properties)?;
    write_atomically(&self.properties_path(container, key), &sidecar).await
  }

  async fn properties(&self, container: &str, key: &str) -> Result<Option<BlobProperties>> {
    validate_name("container", container)?;
    validate_name("key", key)?;
    let path = self.properties_path(container, key);
    match fs::read(&path).await {
      Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(storage_err("read", &path, e)),
    }
  }
}
