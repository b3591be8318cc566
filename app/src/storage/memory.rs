// order-relay/src/storage/memory.rs

use super::{validate_name, BlobProperties, BlobStore};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct StoredBlob {
  bytes: Vec<u8>,
  properties: BlobProperties,
}

/// In-process store. Containers map object keys to bytes plus properties.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
  containers: RwLock<HashMap<String, HashMap<String, StoredBlob>>>,
}

impl MemoryBlobStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn object_count(&self, container: &str) -> usize {
    self.containers.read().get(container).map_or(0, HashMap::len)
  }

  pub fn get(&self, container: &str, key: &str) -> Option<Vec<u8>> {
    self
      .containers
      .read()
      .get(container)
      .and_then(|objects| objects.get(key))
      .map(|blob| blob.bytes.clone())
  }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
  async fn ensure_container(&self, container: &str) -> Result<bool> {
    validate_name("container", container)?;
    let mut containers = self.containers.write();
    if containers.contains_key(container) {
      return Ok(false);
    }
    containers.insert(container.to_string(), HashMap::new());
    Ok(true)
  }

  async fn exists(&self, container: &str) -> Result<bool> {
    validate_name("container", container)?;
    Ok(self.containers.read().contains_key(container))
  }

  async fn put(&self, container: &str, key: &str, bytes: &[u8], content_type: &str) -> Result<()> {
    validate_name("container", container)?;
    validate_name("key", key)?;
    let mut containers = self.containers.write();
    let objects = containers
      .get_mut(container)
      .ok_or_else(|| AppError::TransientStorage(format!("container '{}' does not exist", container)))?;
    objects.insert(
      key.to_string(),
      StoredBlob {
        bytes: bytes.to_vec(),
        properties: BlobProperties {
          content_type: content_type.to_string(),
          content_length: bytes.len() as u64,
          last_modified: Utc::now(),
        },
      },
    );
    Ok(())
  }

  async fn properties(&self, container: &str, key: &str) -> Result<Option<BlobProperties>> {
    validate_name("container", container)?;
    validate_name("key", key)?;
    Ok(
      self
        .containers
        .read()
        .get(container)
        .and_then(|objects| objects.get(key))
        .map(|blob| blob.properties.clone()),
    )
  }
}
