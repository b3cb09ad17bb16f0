//! Knowledge store configuration
//!
//! Settings come from a YAML file, the environment, or both (environment wins).

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_COLLECTION: &str = "story_knowledge_base";
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

pub const ENV_COLLECTION: &str = "LOREBASE_COLLECTION";
pub const ENV_INDEX_URL: &str = "LOREBASE_INDEX_URL";
pub const ENV_INDEX_API_KEY: &str = "LOREBASE_INDEX_API_KEY";
pub const ENV_EMBEDDING_MODEL: &str = "LOREBASE_EMBEDDING_MODEL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
  /// Collection that holds the seeded knowledge
  pub collection: String,
  /// Vector database location; `None` keeps everything in memory
  pub index_url: Option<String>,
  pub index_api_key: Option<String>,
  /// Pretrained embedding model, by hub name
  pub model: String,
}

impl Default for KnowledgeConfig {
  fn default() -> Self {
    Self {
      collection: DEFAULT_COLLECTION.to_string(),
      index_url: None,
      index_api_key: None,
      model: DEFAULT_MODEL.to_string(),
    }
  }
}

/// Where points are stored, resolved from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexLocation {
  Memory,
  Url { url: String, api_key: Option<String> },
}

impl KnowledgeConfig {
  /// Defaults overridden by any `LOREBASE_*` variables that are set
  pub fn from_env() -> Self {
    Self::default().with_env_overrides()
  }

  /// Load a YAML config file, then apply environment overrides
  pub fn from_file(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path)
      .map_err(|e| anyhow!("Failed to read config {}: {}", path.display(), e))?;
    let config: KnowledgeConfig = serde_yaml::from_str(&content)
      .map_err(|e| anyhow!("Failed to parse config {}: {}", path.display(), e))?;
    Ok(config.with_env_overrides())
  }

  pub fn with_env_overrides(mut self) -> Self {
    if let Some(collection) = read_env(ENV_COLLECTION) {
      self.collection = collection;
    }
    if let Some(url) = read_env(ENV_INDEX_URL) {
      self.index_url = Some(url);
    }
    if let Some(key) = read_env(ENV_INDEX_API_KEY) {
      self.index_api_key = Some(key);
    }
    if let Some(model) = read_env(ENV_EMBEDDING_MODEL) {
      self.model = model;
    }
    self
  }

  /// Resolve the index location. An API key without a URL is ignored.
  pub fn index_location(&self) -> IndexLocation {
    match non_empty(self.index_url.as_deref()) {
      Some(url) => IndexLocation::Url {
        url: url.to_string(),
        api_key: non_empty(self.index_api_key.as_deref()).map(str::to_string),
      },
      None => {
        if non_empty(self.index_api_key.as_deref()).is_some() {
          scribe::warn!("Index API key is set without an index URL; using the in-memory index");
        }
        IndexLocation::Memory
      }
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.collection.trim().is_empty() {
      return Err(anyhow!("Collection name must not be empty"));
    }
    if self.model.trim().is_empty() {
      return Err(anyhow!("Embedding model name must not be empty"));
    }
    Ok(())
  }
}

/// Read an environment variable, treating empty values as unset
fn read_env(key: &str) -> Option<String> {
  std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
  value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  const ALL_VARS: [&str; 4] = [ENV_COLLECTION, ENV_INDEX_URL, ENV_INDEX_API_KEY, ENV_EMBEDDING_MODEL];

  fn clear_env() {
    for key in ALL_VARS {
      std::env::remove_var(key);
    }
  }

  #[test]
  fn defaults_point_at_story_collection_in_memory() {
    let config = KnowledgeConfig::default();
    assert_eq!(config.collection, "story_knowledge_base");
    assert_eq!(config.model, DEFAULT_MODEL);
    assert_eq!(config.index_location(), IndexLocation::Memory);
  }

  #[test]
  fn url_with_key_resolves_to_remote() {
    let config = KnowledgeConfig {
      index_url: Some("db://stories".to_string()),
      index_api_key: Some("secret".to_string()),
      ..Default::default()
    };
    assert_eq!(
      config.index_location(),
      IndexLocation::Url { url: "db://stories".to_string(), api_key: Some("secret".to_string()) }
    );
  }

  #[test]
  fn key_without_url_stays_in_memory() {
    let config =
      KnowledgeConfig { index_api_key: Some("secret".to_string()), ..Default::default() };
    assert_eq!(config.index_location(), IndexLocation::Memory);
  }

  #[test]
  fn blank_url_counts_as_unset() {
    let config = KnowledgeConfig { index_url: Some("  ".to_string()), ..Default::default() };
    assert_eq!(config.index_location(), IndexLocation::Memory);
  }

  #[test]
  fn partial_yaml_keeps_defaults() {
    let config: KnowledgeConfig = serde_yaml::from_str("collection: physics\n").unwrap();
    assert_eq!(config.collection, "physics");
    assert_eq!(config.model, DEFAULT_MODEL);
    assert!(config.index_url.is_none());
  }

  #[test]
  fn empty_collection_is_invalid() {
    let config = KnowledgeConfig { collection: String::new(), ..Default::default() };
    assert!(config.validate().is_err());
  }

  #[test]
  #[serial]
  fn environment_overrides_yaml_file() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lorebase.yaml");
    std::fs::write(&path, "collection: history\nmodel: file/model\n").unwrap();
    std::env::set_var(ENV_COLLECTION, "physics");

    let config = KnowledgeConfig::from_file(&path).unwrap();
    clear_env();

    assert_eq!(config.collection, "physics");
    assert_eq!(config.model, "file/model");
  }

  #[test]
  #[serial]
  fn empty_index_url_variable_counts_as_unset() {
    clear_env();
    std::env::set_var(ENV_INDEX_URL, "");

    let config = KnowledgeConfig::from_env();
    clear_env();

    assert!(config.index_url.is_none());
    assert_eq!(config.index_location(), IndexLocation::Memory);
  }

  #[test]
  #[serial]
  fn from_env_reads_every_variable() {
    clear_env();
    std::env::set_var(ENV_COLLECTION, "geography");
    std::env::set_var(ENV_INDEX_URL, "/var/lib/lorebase");
    std::env::set_var(ENV_INDEX_API_KEY, "secret");
    std::env::set_var(ENV_EMBEDDING_MODEL, "org/model");

    let config = KnowledgeConfig::from_env();
    clear_env();

    assert_eq!(config.collection, "geography");
    assert_eq!(config.model, "org/model");
    assert_eq!(
      config.index_location(),
      IndexLocation::Url {
        url: "/var/lib/lorebase".to_string(),
        api_key: Some("secret".to_string())
      }
    );
  }
}
