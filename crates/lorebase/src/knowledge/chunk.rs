//! Text chunks and the identifiers their points are stored under

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::index::Payload;

/// Free-form metadata attached to a chunk
pub type Metadata = Map<String, Value>;

pub const TEXT_KEY: &str = "text";
/// Search results carry their similarity under this key
pub const SCORE_KEY: &str = "score";

/// A piece of source knowledge waiting to be seeded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
  pub text: String,
  #[serde(default)]
  pub metadata: Metadata,
}

impl TextChunk {
  pub fn new(text: impl Into<String>) -> Self {
    Self { text: text.into(), metadata: Metadata::new() }
  }

  pub fn with_metadata(text: impl Into<String>, metadata: Metadata) -> Self {
    Self { text: text.into(), metadata }
  }

  /// Pair texts with metadata. Missing entries become empty maps and
  /// surplus entries are dropped.
  pub fn zip(texts: &[String], metadata: Option<Vec<Metadata>>) -> Vec<TextChunk> {
    let mut metadata = metadata.unwrap_or_default().into_iter();
    texts
      .iter()
      .map(|text| TextChunk::with_metadata(text.clone(), metadata.next().unwrap_or_default()))
      .collect()
  }

  /// Stored payload: the metadata plus the chunk text under `"text"`.
  /// Reserved keys in the metadata are dropped.
  pub fn payload(&self) -> Payload {
    let mut payload = self.metadata.clone();
    for key in [TEXT_KEY, SCORE_KEY] {
      if payload.remove(key).is_some() {
        scribe::warn!("Metadata key '{key}' is reserved; dropping it");
      }
    }
    payload.insert(TEXT_KEY.to_string(), Value::String(self.text.clone()));
    payload
  }

  /// Identifier derived from the collection, text and metadata.
  /// Equal chunks map to the same point; re-seeding one overwrites it.
  pub fn point_id(&self, collection: &str) -> u64 {
    // serde_json maps are sorted, so the metadata encoding is canonical
    let metadata = Value::Object(self.metadata.clone()).to_string();
    let name = format!("{collection}\0{}\0{metadata}", self.text);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).as_u64_pair().0
  }
}
