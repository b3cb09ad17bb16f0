//! Operator command line: seed knowledge into a configured index and search it

pub mod commands;
pub mod display;

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::config::{
  KnowledgeConfig, ENV_COLLECTION, ENV_EMBEDDING_MODEL, ENV_INDEX_API_KEY, ENV_INDEX_URL,
};

/// Connection settings shared by every command
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
  /// YAML file with collection, index_url, index_api_key and model keys
  #[arg(long, global = true)]
  pub config: Option<PathBuf>,

  /// Collection holding the knowledge
  #[arg(long, global = true, env = ENV_COLLECTION)]
  pub collection: Option<String>,

  /// LanceDB location (directory, memory://, or db://); in-memory when omitted
  #[arg(long, global = true, env = ENV_INDEX_URL)]
  pub index_url: Option<String>,

  /// API key for a remote index
  #[arg(long, global = true, env = ENV_INDEX_API_KEY, hide_env_values = true)]
  pub api_key: Option<String>,

  /// Embedding model name on the Hugging Face hub
  #[arg(long, global = true, env = ENV_EMBEDDING_MODEL)]
  pub model: Option<String>,
}

impl ConnectionArgs {
  /// Config file (or defaults), then environment, then explicit flags
  pub fn resolve(&self) -> Result<KnowledgeConfig> {
    let mut config = match &self.config {
      Some(path) => KnowledgeConfig::from_file(path)?,
      None => KnowledgeConfig::from_env(),
    };

    if let Some(collection) = non_blank(&self.collection) {
      config.collection = collection;
    }
    if let Some(url) = non_blank(&self.index_url) {
      config.index_url = Some(url);
    }
    if let Some(key) = non_blank(&self.api_key) {
      config.index_api_key = Some(key);
    }
    if let Some(model) = non_blank(&self.model) {
      config.model = model;
    }

    config.validate()?;
    Ok(config)
  }
}

fn non_blank(value: &Option<String>) -> Option<String> {
  value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  fn clear_env() {
    for key in [ENV_COLLECTION, ENV_INDEX_URL, ENV_INDEX_API_KEY, ENV_EMBEDDING_MODEL] {
      std::env::remove_var(key);
    }
  }

  #[test]
  #[serial]
  fn flags_override_defaults() {
    clear_env();
    let args = ConnectionArgs {
      collection: Some("physics".to_string()),
      index_url: Some("/tmp/lore".to_string()),
      ..Default::default()
    };
    let config = args.resolve().unwrap();
    assert_eq!(config.collection, "physics");
    assert_eq!(config.index_url.as_deref(), Some("/tmp/lore"));
  }

  #[test]
  #[serial]
  fn config_file_is_read_before_flags() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lorebase.yaml");
    std::fs::write(&path, "collection: history\nmodel: custom/model\n").unwrap();

    let args = ConnectionArgs {
      config: Some(path),
      model: Some("override/model".to_string()),
      ..Default::default()
    };
    let config = args.resolve().unwrap();
    assert_eq!(config.collection, "history");
    assert_eq!(config.model, "override/model");
  }

  #[test]
  #[serial]
  fn blank_flags_are_ignored() {
    clear_env();
    let args = ConnectionArgs { collection: Some(" ".to_string()), ..Default::default() };
    assert_eq!(args.resolve().unwrap().collection, crate::config::DEFAULT_COLLECTION);
  }
}
