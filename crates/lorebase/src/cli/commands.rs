use anyhow::{anyhow, Result};
use colored::*;
use std::path::Path;

use crate::cli::display::display_search_result;
use crate::config::{IndexLocation, KnowledgeConfig};
use crate::knowledge::{KnowledgeStore, Metadata, SeedOutcome, TextChunk, TopicKnowledge};

/// Where the facts to seed come from and what to tag them with
#[derive(Debug, Default)]
pub struct SeedRequest {
  pub texts: Vec<String>,
  pub file: Option<std::path::PathBuf>,
  pub topic: Option<TopicKnowledge>,
  /// Extra metadata as a JSON object, merged into every chunk
  pub metadata: Option<String>,
}

/// Seed knowledge into the configured collection
pub async fn seed(config: &KnowledgeConfig, request: SeedRequest) -> Result<()> {
  let texts = collect_texts(&request.texts, request.file.as_deref())?;
  let chunks = build_chunks(&texts, request.topic.as_ref(), request.metadata.as_deref())?;

  let store = KnowledgeStore::open(config).await?;
  match store.seed_chunks(chunks).await {
    SeedOutcome::Skipped => println!("Nothing to seed."),
    SeedOutcome::Seeded(count) => {
      println!("{} Seeded {} chunks into {}", "✓".green(), count, store.collection().cyan())
    }
    SeedOutcome::Failed(e) => return Err(anyhow!("Seeding failed: {}", e)),
  }
  Ok(())
}

/// Search the collection and print ranked snippets
pub async fn search(config: &KnowledgeConfig, terms: &[String], limit: usize, json: bool) -> Result<()> {
  let query = terms.join(" ");
  if query.trim().is_empty() {
    return Err(anyhow!("Search query must not be empty"));
  }

  let store = KnowledgeStore::open(config).await?;
  let results = store.try_retrieve(&query, limit).await?;

  if json {
    println!("{}", serde_json::to_string_pretty(&results)?);
    return Ok(());
  }

  if results.is_empty() {
    println!("No matches for {}", query.yellow());
    return Ok(());
  }

  for (i, result) in results.iter().enumerate() {
    display_search_result(i + 1, result);
  }
  Ok(())
}

/// Show where knowledge lives and how much of it there is
pub async fn status(config: &KnowledgeConfig) -> Result<()> {
  let store = KnowledgeStore::open(config).await?;
  let count = store.point_count().await?;

  let location = match config.index_location() {
    IndexLocation::Memory => "in-memory".to_string(),
    IndexLocation::Url { url, api_key } => match api_key {
      Some(_) => format!("{url} (authenticated)"),
      None => url,
    },
  };

  println!("{:<12} {}", "collection".bold(), store.collection().cyan());
  println!("{:<12} {}", "index".bold(), location);
  println!("{:<12} {}", "model".bold(), store.embeddings().model_name());
  println!("{:<12} {}", "points".bold(), count);
  Ok(())
}

/// Texts from arguments followed by non-blank lines of the file
fn collect_texts(texts: &[String], file: Option<&Path>) -> Result<Vec<String>> {
  let mut all: Vec<String> = texts.iter().filter(|t| !t.trim().is_empty()).cloned().collect();

  if let Some(path) = file {
    let content = std::fs::read_to_string(path)
      .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
    all.extend(content.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string));
  }

  Ok(all)
}

fn build_chunks(
  texts: &[String],
  topic: Option<&TopicKnowledge>,
  metadata: Option<&str>,
) -> Result<Vec<TextChunk>> {
  let mut base = match topic {
    Some(topic) => topic.metadata(),
    None => Metadata::new(),
  };

  if let Some(raw) = metadata {
    let extra: Metadata =
      serde_json::from_str(raw).map_err(|e| anyhow!("--metadata must be a JSON object: {}", e))?;
    base.extend(extra);
  }

  Ok(texts.iter().map(|text| TextChunk::with_metadata(text.clone(), base.clone())).collect())
}
