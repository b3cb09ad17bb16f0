//! Embedding provider: turns text into fixed-dimension vectors
//!
//! The model behind the provider is created on first use through a
//! [`ModelLoader`] and kept for the provider's lifetime.

pub mod hashing;
#[cfg(feature = "ml-features")]
pub mod onnx;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell};

use crate::config::KnowledgeConfig;

pub use hashing::{HashingEmbeddingModel, HashingLoader};

/// A loaded text-embedding model
pub trait EmbeddingModel: Send {
  /// Length of every vector this model produces
  fn dimension(&self) -> usize;

  /// Embed a single text
  fn embed(&mut self, text: &str) -> Result<Vec<f32>>;

  /// Embed several texts, preserving order
  fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    texts.iter().map(|text| self.embed(text)).collect()
  }
}

/// Creates an [`EmbeddingModel`] on demand
#[async_trait]
pub trait ModelLoader: Send + Sync {
  fn model_name(&self) -> &str;

  async fn load(&self) -> Result<Box<dyn EmbeddingModel>>;
}

pub struct EmbeddingProvider {
  loader: Box<dyn ModelLoader>,
  model: OnceCell<Mutex<Box<dyn EmbeddingModel>>>,
}

impl EmbeddingProvider {
  pub fn new<L: ModelLoader + 'static>(loader: L) -> Self {
    Self { loader: Box::new(loader), model: OnceCell::new() }
  }

  /// Provider for the configured model.
  ///
  /// Builds without `ml-features` have no neural runtime and fall back to the
  /// hashing model.
  pub fn from_config(config: &KnowledgeConfig) -> Self {
    #[cfg(feature = "ml-features")]
    {
      Self::new(onnx::OnnxLoader::new(&config.model))
    }

    #[cfg(not(feature = "ml-features"))]
    {
      scribe::warn!(
        "Built without ml-features; using the hashing embedder instead of {}",
        config.model
      );
      Self::new(HashingLoader::default())
    }
  }

  pub fn model_name(&self) -> &str {
    self.loader.model_name()
  }

  /// Whether the model has been created yet
  pub fn is_loaded(&self) -> bool {
    self.model.initialized()
  }

  /// Get the model, creating it on the first call. Concurrent first callers
  /// share a single load.
  async fn model(&self) -> Result<&Mutex<Box<dyn EmbeddingModel>>> {
    self
      .model
      .get_or_try_init(|| async {
        scribe::info!("Loading embedding model {}...", self.loader.model_name());
        let model = self.loader.load().await?;
        scribe::verbose!("Embedding model ready ({} dimensions)", model.dimension());
        Ok::<_, anyhow::Error>(Mutex::new(model))
      })
      .await
  }

  pub async fn dimension(&self) -> Result<usize> {
    let model = self.model().await?.lock().await;
    Ok(model.dimension())
  }

  pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    let mut model = self.model().await?.lock().await;
    let embedding = model.embed(text)?;
    validate_dimension(&embedding, model.dimension())?;
    Ok(embedding)
  }

  pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
      return Ok(Vec::new());
    }

    let mut model = self.model().await?.lock().await;
    let embeddings = model.embed_batch(texts)?;
    for embedding in &embeddings {
      validate_dimension(embedding, model.dimension())?;
    }
    Ok(embeddings)
  }
}

fn validate_dimension(embedding: &[f32], expected: usize) -> Result<()> {
  if embedding.len() != expected {
    return Err(anyhow!(
      "Embedding has {} dimensions, model declares {}",
      embedding.len(),
      expected
    ));
  }
  Ok(())
}
