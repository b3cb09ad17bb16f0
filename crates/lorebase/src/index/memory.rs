//! In-process vector index, used when no database URL is configured
//!
//! Points live in a map per collection and queries are a brute-force cosine scan.
//! Nothing survives the process.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use super::{IndexedPoint, Payload, ScoredPoint, VectorIndex};
use crate::similarity::cosine_similarity;

struct Collection {
  dimension: usize,
  points: BTreeMap<u64, StoredPoint>,
}

struct StoredPoint {
  vector: Vec<f32>,
  payload: Payload,
}

#[derive(Default)]
pub struct MemoryIndex {
  collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryIndex {
  pub fn new() -> Self {
    Self::default()
  }

  /// Dimension of a collection, if it exists
  pub fn dimension_of(&self, name: &str) -> Option<usize> {
    self.collections.read().ok()?.get(name).map(|c| c.dimension)
  }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
  async fn collection_names(&self) -> Result<Vec<String>> {
    let collections = self.collections.read().map_err(|_| anyhow!("Index lock poisoned"))?;
    let mut names: Vec<String> = collections.keys().cloned().collect();
    names.sort();
    Ok(names)
  }

  async fn create_collection(&self, name: &str, dimension: usize) -> Result<()> {
    if dimension == 0 {
      return Err(anyhow!("Collection '{}' needs a non-zero dimension", name));
    }

    let mut collections = self.collections.write().map_err(|_| anyhow!("Index lock poisoned"))?;
    if collections.contains_key(name) {
      return Err(anyhow!("Collection '{}' already exists", name));
    }

    collections.insert(name.to_string(), Collection { dimension, points: BTreeMap::new() });
    scribe::verbose!("Created in-memory collection '{name}' ({dimension} dimensions)");
    Ok(())
  }

  async fn upsert(&self, collection: &str, points: Vec<IndexedPoint>) -> Result<()> {
    let mut collections = self.collections.write().map_err(|_| anyhow!("Index lock poisoned"))?;
    let target = collections
      .get_mut(collection)
      .ok_or_else(|| anyhow!("Collection '{}' not found", collection))?;

    // Validate the whole batch before touching stored points
    if let Some(bad) = points.iter().find(|p| p.vector.len() != target.dimension) {
      return Err(anyhow!(
        "Point {} has {} dimensions, collection '{}' expects {}",
        bad.id,
        bad.vector.len(),
        collection,
        target.dimension
      ));
    }

    for point in points {
      target.points.insert(point.id, StoredPoint { vector: point.vector, payload: point.payload });
    }
    Ok(())
  }

  async fn query(&self, collection: &str, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
    let collections = self.collections.read().map_err(|_| anyhow!("Index lock poisoned"))?;
    let target =
      collections.get(collection).ok_or_else(|| anyhow!("Collection '{}' not found", collection))?;

    if vector.len() != target.dimension {
      return Err(anyhow!(
        "Query has {} dimensions, collection '{}' expects {}",
        vector.len(),
        collection,
        target.dimension
      ));
    }

    let mut scored: Vec<ScoredPoint> = target
      .points
      .iter()
      .map(|(&id, point)| ScoredPoint {
        id,
        score: cosine_similarity(vector, &point.vector),
        payload: point.payload.clone(),
      })
      .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
    scored.truncate(limit);
    Ok(scored)
  }

  async fn point_count(&self, collection: &str) -> Result<usize> {
    let collections = self.collections.read().map_err(|_| anyhow!("Index lock poisoned"))?;
    collections
      .get(collection)
      .map(|c| c.points.len())
      .ok_or_else(|| anyhow!("Collection '{}' not found", collection))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::index::CollectionStatus;
  use serde_json::json;

  fn point(id: u64, vector: Vec<f32>, text: &str) -> IndexedPoint {
    let mut payload = Payload::new();
    payload.insert("text".to_string(), json!(text));
    IndexedPoint { id, vector, payload }
  }

  #[tokio::test]
  async fn ensure_collection_is_idempotent() {
    let index = MemoryIndex::new();
    assert_eq!(index.ensure_collection("kb", 3).await.unwrap(), CollectionStatus::Created);
    assert_eq!(index.ensure_collection("kb", 3).await.unwrap(), CollectionStatus::AlreadyExists);
    assert_eq!(index.collection_names().await.unwrap(), vec!["kb".to_string()]);
  }

  #[tokio::test]
  async fn creating_twice_directly_fails() {
    let index = MemoryIndex::new();
    index.create_collection("kb", 3).await.unwrap();
    assert!(index.create_collection("kb", 3).await.is_err());
  }

  #[tokio::test]
  async fn query_orders_by_similarity_and_respects_limit() {
    let index = MemoryIndex::new();
    index.create_collection("kb", 2).await.unwrap();
    index
      .upsert(
        "kb",
        vec![
          point(1, vec![1.0, 0.0], "east"),
          point(2, vec![0.0, 1.0], "north"),
          point(3, vec![0.7, 0.7], "north-east"),
        ],
      )
      .await
      .unwrap();

    let results = index.query("kb", &[1.0, 0.1], 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, 1);
    assert_eq!(results[1].id, 3);
    assert!(results[0].score >= results[1].score);
  }

  #[tokio::test]
  async fn upsert_replaces_same_id() {
    let index = MemoryIndex::new();
    index.create_collection("kb", 2).await.unwrap();
    index.upsert("kb", vec![point(7, vec![1.0, 0.0], "old")]).await.unwrap();
    index.upsert("kb", vec![point(7, vec![0.0, 1.0], "new")]).await.unwrap();

    assert_eq!(index.point_count("kb").await.unwrap(), 1);
    let results = index.query("kb", &[0.0, 1.0], 5).await.unwrap();
    assert_eq!(results[0].payload["text"], json!("new"));
  }

  #[tokio::test]
  async fn wrong_dimension_batch_is_rejected_whole() {
    let index = MemoryIndex::new();
    index.create_collection("kb", 2).await.unwrap();
    let result = index
      .upsert("kb", vec![point(1, vec![1.0, 0.0], "ok"), point(2, vec![1.0], "short")])
      .await;

    assert!(result.is_err());
    assert_eq!(index.point_count("kb").await.unwrap(), 0);
  }

  #[tokio::test]
  async fn unknown_collection_is_an_error() {
    let index = MemoryIndex::new();
    assert!(index.query("missing", &[1.0], 3).await.is_err());
    assert!(index.upsert("missing", vec![]).await.is_err());
  }

  #[tokio::test]
  async fn zero_limit_returns_nothing() {
    let index = MemoryIndex::new();
    index.create_collection("kb", 2).await.unwrap();
    index.upsert("kb", vec![point(1, vec![1.0, 0.0], "east")]).await.unwrap();
    assert!(index.query("kb", &[1.0, 0.0], 0).await.unwrap().is_empty());
  }
}
