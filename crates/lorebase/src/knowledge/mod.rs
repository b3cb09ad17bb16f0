//! Knowledge store: seeds text into the vector index and retrieves the
//! snippets most relevant to a query.
//!
//! `seed` and `retrieve` never fail outright. Problems are logged and show up
//! as [`SeedOutcome::Failed`] or an empty result list. Callers that need to
//! tell "no matches" from "search failed" use [`KnowledgeStore::retrieve_outcome`]
//! or the `try_*` variants.

mod chunk;
mod outcome;
mod topic;

use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::config::KnowledgeConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{KnowledgeError, Result};
use crate::index::{self, CollectionStatus, IndexedPoint, VectorIndex};

pub use chunk::{Metadata, TextChunk};
pub use outcome::{RetrievalOutcome, SearchResult, SeedOutcome};
pub use topic::{TopicKnowledge, DEFAULT_CURRICULUM, DEFAULT_GRADE};

pub const DEFAULT_RETRIEVE_LIMIT: usize = 5;

pub struct KnowledgeStore {
  embeddings: EmbeddingProvider,
  index: Arc<dyn VectorIndex>,
  collection: String,
  ready: OnceCell<()>,
}

impl KnowledgeStore {
  pub fn new(
    embeddings: EmbeddingProvider,
    index: Arc<dyn VectorIndex>,
    collection: impl Into<String>,
  ) -> Self {
    Self { embeddings, index, collection: collection.into(), ready: OnceCell::new() }
  }

  /// Build a store from configuration and make sure its collection exists.
  ///
  /// Only configuration and connection problems are returned; a failure to
  /// create the collection is logged and retried on the next write.
  pub async fn open(config: &KnowledgeConfig) -> Result<Self> {
    config.validate().map_err(|e| KnowledgeError::Config(e.to_string()))?;
    let index = index::open_index(config).await.map_err(KnowledgeError::Index)?;
    let store = Self::new(EmbeddingProvider::from_config(config), index, config.collection.clone());
    store.initialize().await;
    Ok(store)
  }

  pub fn collection(&self) -> &str {
    &self.collection
  }

  pub fn embeddings(&self) -> &EmbeddingProvider {
    &self.embeddings
  }

  /// Ensure the collection exists, logging instead of failing
  pub async fn initialize(&self) -> Option<CollectionStatus> {
    match self.try_initialize().await {
      Ok(status) => Some(status),
      Err(e) => {
        scribe::error!("Error creating collection '{}': {e}", self.collection);
        None
      }
    }
  }

  /// Ensure the collection exists with the embedding model's dimension
  pub async fn try_initialize(&self) -> Result<CollectionStatus> {
    let dimension = self.embeddings.dimension().await.map_err(KnowledgeError::Embedding)?;
    let status = self
      .index
      .ensure_collection(&self.collection, dimension)
      .await
      .map_err(KnowledgeError::Index)?;

    if status == CollectionStatus::Created {
      scribe::info!("Created collection '{}' ({dimension} dimensions)", self.collection);
    }
    let _ = self.ready.set(());
    Ok(status)
  }

  /// Make sure the collection exists once per store before touching it
  async fn ensure_ready(&self) -> Result<()> {
    self.ready.get_or_try_init(|| async { self.try_initialize().await.map(|_| ()) }).await?;
    Ok(())
  }

  /// Seed texts, pairing each with the matching metadata entry (or none)
  pub async fn seed(&self, texts: &[String], metadata: Option<Vec<Metadata>>) -> SeedOutcome {
    self.seed_chunks(TextChunk::zip(texts, metadata)).await
  }

  /// Seed facts about a topic, tagging each with subject, topic, grade and curriculum
  pub async fn seed_topic(&self, topic: &TopicKnowledge, facts: &[String]) -> SeedOutcome {
    scribe::verbose!("Seeding {} facts for {} / {}", facts.len(), topic.subject, topic.full_topic());
    self.seed_chunks(topic.chunks(facts)).await
  }

  pub async fn seed_chunks(&self, chunks: Vec<TextChunk>) -> SeedOutcome {
    if chunks.is_empty() {
      return SeedOutcome::Skipped;
    }

    match self.try_seed(chunks).await {
      Ok(count) => SeedOutcome::Seeded(count),
      Err(e) => {
        scribe::error!("Error adding texts to '{}': {e}", self.collection);
        SeedOutcome::Failed(e)
      }
    }
  }

  /// Embed all chunks in one batch and upsert them. Returns the number written.
  pub async fn try_seed(&self, chunks: Vec<TextChunk>) -> Result<usize> {
    if chunks.is_empty() {
      return Ok(0);
    }

    self.ensure_ready().await?;

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = self.embeddings.embed_batch(&texts).await.map_err(KnowledgeError::Embedding)?;
    if vectors.len() != chunks.len() {
      return Err(KnowledgeError::EmbeddingCount { expected: chunks.len(), got: vectors.len() });
    }

    let points: Vec<IndexedPoint> = chunks
      .iter()
      .zip(vectors)
      .map(|(chunk, vector)| IndexedPoint {
        id: chunk.point_id(&self.collection),
        vector,
        payload: chunk.payload(),
      })
      .collect();

    let count = points.len();
    self.index.upsert(&self.collection, points).await.map_err(KnowledgeError::Index)?;
    scribe::verbose!("Seeded {count} chunks into '{}'", self.collection);
    Ok(count)
  }

  /// Top `limit` snippets for the query, most similar first.
  /// Any failure is logged and yields an empty list.
  pub async fn retrieve(&self, query: &str, limit: usize) -> Vec<SearchResult> {
    self.retrieve_outcome(query, limit).await.into_results()
  }

  pub async fn retrieve_outcome(&self, query: &str, limit: usize) -> RetrievalOutcome {
    match self.try_retrieve(query, limit).await {
      Ok(results) => RetrievalOutcome::from_results(results),
      Err(e) => {
        scribe::error!("Error searching '{}': {e}", self.collection);
        RetrievalOutcome::Failed(e)
      }
    }
  }

  pub async fn try_retrieve(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
    if limit == 0 {
      return Ok(Vec::new());
    }

    self.ensure_ready().await?;

    let vector = self.embeddings.embed(query).await.map_err(KnowledgeError::Embedding)?;
    let points = self
      .index
      .query(&self.collection, &vector, limit)
      .await
      .map_err(KnowledgeError::Index)?;

    Ok(points.into_iter().take(limit).map(SearchResult::from).collect())
  }

  /// Number of points in the collection
  pub async fn point_count(&self) -> Result<usize> {
    self.index.point_count(&self.collection).await.map_err(KnowledgeError::Index)
  }
}
