//! Results handed back to callers of the knowledge store

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::chunk::{Metadata, SCORE_KEY, TEXT_KEY};
use crate::error::KnowledgeError;
use crate::index::ScoredPoint;

/// A retrieved snippet: its text, similarity, and the rest of its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
  pub text: String,
  pub score: f32,
  #[serde(flatten)]
  pub extra: Metadata,
}

impl From<ScoredPoint> for SearchResult {
  fn from(point: ScoredPoint) -> Self {
    let mut extra = point.payload;
    let text = match extra.remove(TEXT_KEY) {
      Some(Value::String(text)) => text,
      _ => String::new(),
    };
    // Points written before the key was reserved may still carry it
    extra.remove(SCORE_KEY);
    Self { text, score: point.score, extra }
  }
}

/// What happened to a seed request
#[derive(Debug)]
pub enum SeedOutcome {
  /// Nothing to seed; no model or index calls were made
  Skipped,
  Seeded(usize),
  Failed(KnowledgeError),
}

impl SeedOutcome {
  pub fn seeded(&self) -> usize {
    match self {
      SeedOutcome::Seeded(count) => *count,
      _ => 0,
    }
  }

  pub fn is_failure(&self) -> bool {
    matches!(self, SeedOutcome::Failed(_))
  }
}

/// What a search produced, keeping "nothing relevant" apart from "search failed"
#[derive(Debug)]
pub enum RetrievalOutcome {
  Matches(Vec<SearchResult>),
  NoMatches,
  Failed(KnowledgeError),
}

impl RetrievalOutcome {
  pub fn from_results(results: Vec<SearchResult>) -> Self {
    if results.is_empty() {
      RetrievalOutcome::NoMatches
    } else {
      RetrievalOutcome::Matches(results)
    }
  }

  /// Collapse to a plain list; failures become an empty list
  pub fn into_results(self) -> Vec<SearchResult> {
    match self {
      RetrievalOutcome::Matches(results) => results,
      RetrievalOutcome::NoMatches | RetrievalOutcome::Failed(_) => Vec::new(),
    }
  }

  pub fn is_failure(&self) -> bool {
    matches!(self, RetrievalOutcome::Failed(_))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn scored(payload: Value) -> ScoredPoint {
    ScoredPoint { id: 1, score: 0.5, payload: payload.as_object().cloned().unwrap_or_default() }
  }

  #[test]
  fn text_is_lifted_out_of_payload() {
    let result = SearchResult::from(scored(json!({"text": "tides follow the moon", "topic": "tides"})));
    assert_eq!(result.text, "tides follow the moon");
    assert_eq!(result.extra.len(), 1);
    assert_eq!(result.extra["topic"], json!("tides"));
  }

  #[test]
  fn missing_text_becomes_empty_string() {
    let result = SearchResult::from(scored(json!({"topic": "tides"})));
    assert_eq!(result.text, "");
  }

  #[test]
  fn serializes_flat() {
    let result = SearchResult::from(scored(json!({"text": "t", "grade": "grade_6"})));
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value, json!({"text": "t", "score": 0.5, "grade": "grade_6"}));
  }

  #[test]
  fn stored_score_never_shadows_similarity() {
    let result = SearchResult::from(scored(json!({"text": "t", "score": 42, "level": "easy"})));
    assert_eq!(result.score, 0.5);

    let encoded = serde_json::to_string(&result).unwrap();
    assert_eq!(encoded.matches("\"score\"").count(), 1);
    let decoded: SearchResult = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, result);
  }

  #[test]
  fn empty_results_are_no_matches() {
    assert!(matches!(RetrievalOutcome::from_results(vec![]), RetrievalOutcome::NoMatches));
  }

  #[test]
  fn failures_collapse_to_empty() {
    let outcome = RetrievalOutcome::Failed(KnowledgeError::Config("x".to_string()));
    assert!(outcome.is_failure());
    assert!(outcome.into_results().is_empty());
  }
}
