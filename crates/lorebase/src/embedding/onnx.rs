//! Sentence-transformer embeddings through ONNX Runtime
//!
//! The tokenizer, ONNX graph and config are fetched from the Hugging Face hub
//! on load and cached by `hf-hub`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use hf_hub::api::tokio::Api;
use ndarray::Array2;
use ort::{session::Session, value::Value};
use std::collections::HashMap;
use std::path::PathBuf;
use tokenizers::Tokenizer;

use super::{EmbeddingModel, ModelLoader};
use crate::similarity::normalize;

const TOKENIZER_FILE: &str = "tokenizer.json";
const MODEL_FILE: &str = "onnx/model.onnx";
const CONFIG_FILE: &str = "config.json";

pub struct OnnxEmbeddingModel {
  session: Session,
  tokenizer: Tokenizer,
  dimension: usize,
}

struct ModelFiles {
  tokenizer_file: PathBuf,
  model_path: PathBuf,
  config_file: PathBuf,
}

#[cfg(not(tarpaulin_include))]
impl OnnxEmbeddingModel {
  /// Download (or reuse cached) model files and build an inference session
  pub async fn load(model_name: &str) -> Result<Self> {
    let files = Self::download_model(model_name).await?;
    let tokenizer = Self::load_tokenizer(files.tokenizer_file)?;
    let dimension = Self::read_hidden_size(&files.config_file)?;
    let session = Session::builder()?.commit_from_file(files.model_path)?;

    Ok(Self { session, tokenizer, dimension })
  }

  async fn download_model(model_name: &str) -> Result<ModelFiles> {
    let api = Api::new().map_err(|e| anyhow!("HF API initialization failed: {}", e))?;
    let repo = api.model(model_name.to_string());

    let tokenizer_file =
      repo.get(TOKENIZER_FILE).await.map_err(|e| anyhow!("Failed to download tokenizer: {}", e))?;
    let model_path =
      repo.get(MODEL_FILE).await.map_err(|e| anyhow!("Failed to download ONNX model: {}", e))?;
    let config_file =
      repo.get(CONFIG_FILE).await.map_err(|e| anyhow!("Failed to download model config: {}", e))?;

    Ok(ModelFiles { tokenizer_file, model_path, config_file })
  }

  fn load_tokenizer(path: PathBuf) -> Result<Tokenizer> {
    Tokenizer::from_file(path).map_err(|e| anyhow!("Failed to load tokenizer: {}", e))
  }

  fn read_hidden_size(path: &PathBuf) -> Result<usize> {
    let content = std::fs::read_to_string(path)?;
    let config: serde_json::Value = serde_json::from_str(&content)?;
    config
      .get("hidden_size")
      .and_then(|v| v.as_u64())
      .map(|v| v as usize)
      .ok_or_else(|| anyhow!("Model config has no hidden_size"))
  }
}

impl OnnxEmbeddingModel {
  fn to_tensor(values: &[u32]) -> Result<Value> {
    let ids: Vec<i64> = values.iter().map(|&x| x as i64).collect();
    let array: Array2<i64> = Array2::from_shape_vec((1, ids.len()), ids)?;
    Ok(Value::from_array(array)?.into())
  }
}

#[cfg(not(tarpaulin_include))]
impl EmbeddingModel for OnnxEmbeddingModel {
  fn dimension(&self) -> usize {
    self.dimension
  }

  fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
    let encoding =
      self.tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let attention_mask = encoding.get_attention_mask().to_vec();

    let mut input = HashMap::new();
    input.insert("input_ids".to_string(), Self::to_tensor(encoding.get_ids())?);
    input.insert("attention_mask".to_string(), Self::to_tensor(&attention_mask)?);
    input.insert("token_type_ids".to_string(), Self::to_tensor(encoding.get_type_ids())?);

    let output = self.session.run(input)?;
    let tensor = output
      .get("last_hidden_state")
      .or_else(|| output.get("0"))
      .ok_or_else(|| anyhow!("No output found from model - expected 'last_hidden_state' or '0'"))?;
    let (shape, data) = tensor.try_extract_tensor::<f32>()?;

    let mut embedding = mean_pool(shape.as_ref(), data, &attention_mask)?;
    normalize(&mut embedding);
    Ok(embedding)
  }
}

/// Average token states over the sequence, counting only attended tokens.
/// `shape` is `[batch, sequence, hidden]`; only the first batch row is read.
pub fn mean_pool(shape: &[i64], data: &[f32], attention_mask: &[u32]) -> Result<Vec<f32>> {
  if shape.len() != 3 {
    return Err(anyhow!("Expected a rank-3 hidden state, got shape {:?}", shape));
  }

  let seq_length = shape[1] as usize;
  let hidden_size = shape[2] as usize;
  let needed = seq_length * hidden_size;
  if data.len() < needed {
    return Err(anyhow!("Hidden state holds {} values, shape needs {}", data.len(), needed));
  }

  let mut pooled = vec![0.0f32; hidden_size];
  let mut attended = 0usize;
  for token_idx in 0..seq_length {
    if attention_mask.get(token_idx).copied().unwrap_or(1) == 0 {
      continue;
    }
    attended += 1;
    let start = token_idx * hidden_size;
    for (i, &value) in data[start..start + hidden_size].iter().enumerate() {
      pooled[i] += value;
    }
  }

  if attended > 0 {
    for value in pooled.iter_mut() {
      *value /= attended as f32;
    }
  }

  Ok(pooled)
}

/// Loads a sentence-transformer by hub name
pub struct OnnxLoader {
  model_name: String,
}

impl OnnxLoader {
  pub fn new(model_name: &str) -> Self {
    Self { model_name: model_name.to_string() }
  }
}

#[async_trait]
impl ModelLoader for OnnxLoader {
  fn model_name(&self) -> &str {
    &self.model_name
  }

  async fn load(&self) -> Result<Box<dyn EmbeddingModel>> {
    Ok(Box::new(OnnxEmbeddingModel::load(&self.model_name).await?))
  }
}
