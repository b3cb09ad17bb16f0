//! Feature-hashing embedder
//!
//! Lowercased word tokens are hashed into a fixed number of signed buckets and
//! the result is normalized. Texts that share words point the same way, which
//! is enough for offline use and tests. No files are downloaded.

use anyhow::Result;
use async_trait::async_trait;

use super::{EmbeddingModel, ModelLoader};
use crate::similarity::normalize;

pub const DEFAULT_DIMENSION: usize = 384;
const MODEL_NAME: &str = "feature-hashing";

pub struct HashingEmbeddingModel {
  dimension: usize,
}

impl HashingEmbeddingModel {
  pub fn new(dimension: usize) -> Self {
    Self { dimension: dimension.max(1) }
  }
}

impl Default for HashingEmbeddingModel {
  fn default() -> Self {
    Self::new(DEFAULT_DIMENSION)
  }
}

impl EmbeddingModel for HashingEmbeddingModel {
  fn dimension(&self) -> usize {
    self.dimension
  }

  fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
    let mut embedding = vec![0.0f32; self.dimension];

    for token in tokenize(text) {
      let hash = fnv1a(token.as_bytes());
      let bucket = (hash % self.dimension as u64) as usize;
      let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
      embedding[bucket] += sign;
    }

    normalize(&mut embedding);
    Ok(embedding)
  }
}

/// Split text into lowercase alphanumeric words
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
  text
    .split(|c: char| !c.is_alphanumeric())
    .filter(|word| !word.is_empty())
    .map(str::to_lowercase)
}

/// 64-bit FNV-1a; stable across platforms and releases
fn fnv1a(bytes: &[u8]) -> u64 {
  const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
  const PRIME: u64 = 0x0000_0100_0000_01b3;

  bytes.iter().fold(OFFSET, |hash, &byte| (hash ^ byte as u64).wrapping_mul(PRIME))
}

/// Loader for [`HashingEmbeddingModel`]
pub struct HashingLoader {
  dimension: usize,
}

impl HashingLoader {
  pub fn new(dimension: usize) -> Self {
    Self { dimension }
  }
}

impl Default for HashingLoader {
  fn default() -> Self {
    Self::new(DEFAULT_DIMENSION)
  }
}

#[async_trait]
impl ModelLoader for HashingLoader {
  fn model_name(&self) -> &str {
    MODEL_NAME
  }

  async fn load(&self) -> Result<Box<dyn EmbeddingModel>> {
    Ok(Box::new(HashingEmbeddingModel::new(self.dimension)))
  }
}
