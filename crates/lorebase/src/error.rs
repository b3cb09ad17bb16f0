//! Error types surfaced at the knowledge store boundary

use thiserror::Error;

/// Why a knowledge store operation failed
#[derive(Debug, Error)]
pub enum KnowledgeError {
  #[error("embedding failed: {0:#}")]
  Embedding(#[source] anyhow::Error),

  #[error("vector index failed: {0:#}")]
  Index(#[source] anyhow::Error),

  #[error("embedding model returned {got} vectors for {expected} texts")]
  EmbeddingCount { expected: usize, got: usize },

  #[error("invalid configuration: {0}")]
  Config(String),
}

pub type Result<T> = std::result::Result<T, KnowledgeError>;
