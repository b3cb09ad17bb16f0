//! Lorebase - Knowledge Seeding and Retrieval
//!
//! Seeds subject and topic knowledge into a vector index and retrieves the
//! snippets most relevant to a query, so a story generator can ground its
//! prompts. An embedding model and a vector database do the heavy lifting;
//! [`knowledge::KnowledgeStore`] composes them.

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod knowledge;
pub mod similarity;

pub use config::KnowledgeConfig;
pub use error::KnowledgeError;
pub use knowledge::{
  KnowledgeStore, Metadata, RetrievalOutcome, SearchResult, SeedOutcome, TextChunk,
  TopicKnowledge,
};
