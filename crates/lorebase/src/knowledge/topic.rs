//! Subject and topic context for seeded knowledge

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::chunk::{Metadata, TextChunk};

pub const DEFAULT_GRADE: &str = "grade_6";
pub const DEFAULT_CURRICULUM: &str = "CBSE";

/// Which lesson a batch of facts belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicKnowledge {
  pub subject: String,
  pub topic: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub specific_area: Option<String>,
  #[serde(default = "default_grade")]
  pub grade: String,
  #[serde(default = "default_curriculum")]
  pub curriculum: String,
}

fn default_grade() -> String {
  DEFAULT_GRADE.to_string()
}

fn default_curriculum() -> String {
  DEFAULT_CURRICULUM.to_string()
}

impl TopicKnowledge {
  pub fn new(subject: impl Into<String>, topic: impl Into<String>) -> Self {
    Self {
      subject: subject.into(),
      topic: topic.into(),
      specific_area: None,
      grade: default_grade(),
      curriculum: default_curriculum(),
    }
  }

  pub fn with_specific_area(mut self, area: impl Into<String>) -> Self {
    self.specific_area = Some(area.into()).filter(|a: &String| !a.trim().is_empty());
    self
  }

  pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
    self.grade = grade.into();
    self
  }

  pub fn with_curriculum(mut self, curriculum: impl Into<String>) -> Self {
    self.curriculum = curriculum.into();
    self
  }

  /// `"{topic} - {specific_area}"`, or just the topic
  pub fn full_topic(&self) -> String {
    match &self.specific_area {
      Some(area) => format!("{} - {}", self.topic, area),
      None => self.topic.clone(),
    }
  }

  pub fn metadata(&self) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("subject".to_string(), Value::String(self.subject.clone()));
    metadata.insert("topic".to_string(), Value::String(self.full_topic()));
    metadata.insert("grade".to_string(), Value::String(self.grade.clone()));
    metadata.insert("curriculum".to_string(), Value::String(self.curriculum.clone()));
    metadata
  }

  /// Attach this topic's metadata to each fact
  pub fn chunks(&self, facts: &[String]) -> Vec<TextChunk> {
    let metadata = self.metadata();
    facts.iter().map(|fact| TextChunk::with_metadata(fact.clone(), metadata.clone())).collect()
  }
}
