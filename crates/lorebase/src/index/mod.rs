//! Vector index abstraction for knowledge storage and retrieval
//!
//! This module provides a generic interface over vector databases so the
//! knowledge store does not care whether points live in memory or in LanceDB.

pub mod memory;
#[cfg(feature = "ml-features")]
pub mod lance;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::config::{IndexLocation, KnowledgeConfig};

pub use memory::MemoryIndex;

/// Payload stored next to each vector: `"text"` plus any metadata keys
pub type Payload = Map<String, Value>;

/// A point to write into a collection
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPoint {
  pub id: u64,
  pub vector: Vec<f32>,
  pub payload: Payload,
}

/// A point returned by a similarity query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
  pub id: u64,
  /// Cosine similarity, higher is more similar
  pub score: f32,
  pub payload: Payload,
}

/// Result of making sure a collection exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
  Created,
  AlreadyExists,
}

/// Vector database interface for storing and searching knowledge embeddings
#[async_trait]
pub trait VectorIndex: Send + Sync {
  /// Names of all collections in the database
  async fn collection_names(&self) -> Result<Vec<String>>;

  /// Create a collection whose vectors have `dimension` entries, compared by cosine
  async fn create_collection(&self, name: &str, dimension: usize) -> Result<()>;

  /// Create the collection only if it is missing
  async fn ensure_collection(&self, name: &str, dimension: usize) -> Result<CollectionStatus> {
    let names = self.collection_names().await?;
    if names.iter().any(|existing| existing == name) {
      return Ok(CollectionStatus::AlreadyExists);
    }

    self.create_collection(name, dimension).await?;
    Ok(CollectionStatus::Created)
  }

  /// Insert points, replacing any with the same id
  async fn upsert(&self, collection: &str, points: Vec<IndexedPoint>) -> Result<()>;

  /// Up to `limit` nearest points, most similar first
  async fn query(&self, collection: &str, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>>;

  /// Number of points stored in the collection
  async fn point_count(&self, collection: &str) -> Result<usize>;
}

/// Open the index the configuration points at
pub async fn open_index(config: &KnowledgeConfig) -> Result<Arc<dyn VectorIndex>> {
  match config.index_location() {
    IndexLocation::Memory => {
      scribe::warn!("No index URL configured; knowledge is kept in memory for this process only");
      Ok(Arc::new(MemoryIndex::new()))
    }
    IndexLocation::Url { url, api_key } => open_remote(&url, api_key.as_deref()).await,
  }
}

#[cfg(feature = "ml-features")]
async fn open_remote(url: &str, api_key: Option<&str>) -> Result<Arc<dyn VectorIndex>> {
  let index = lance::LanceDbIndex::connect(url, api_key).await?;
  Ok(Arc::new(index))
}

#[cfg(not(feature = "ml-features"))]
async fn open_remote(url: &str, _api_key: Option<&str>) -> Result<Arc<dyn VectorIndex>> {
  Err(anyhow::anyhow!(
    "Index URL {url} needs LanceDB support; rebuild with the ml-features feature"
  ))
}
