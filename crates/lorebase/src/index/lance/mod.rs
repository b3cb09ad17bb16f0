//! LanceDB-backed vector index
//!
//! Each collection is a LanceDB table with `id`, `text`, `payload` (JSON) and
//! `vector` columns. Writes are merge-inserts keyed on `id`.

pub mod connection;
pub mod records;
pub mod search;

use anyhow::{anyhow, Result};
use arrow::record_batch::RecordBatchIterator;
use async_trait::async_trait;
use lancedb::{Connection, Table};

use super::{IndexedPoint, ScoredPoint, VectorIndex};
use connection::create_connection;
use records::{dimension_from_schema, knowledge_schema, points_to_batch, ID_COLUMN};
use search::search_nearest;

pub struct LanceDbIndex {
  connection: Connection,
}

impl LanceDbIndex {
  pub async fn connect(uri: &str, api_key: Option<&str>) -> Result<Self> {
    let connection = create_connection(uri, api_key).await?;
    scribe::verbose!("Connected to LanceDB at {uri}");
    Ok(Self { connection })
  }

  async fn open_table(&self, name: &str) -> Result<Table> {
    self
      .connection
      .open_table(name)
      .execute()
      .await
      .map_err(|e| anyhow!("Failed to open table '{}': {}", name, e))
  }
}

#[async_trait]
impl VectorIndex for LanceDbIndex {
  async fn collection_names(&self) -> Result<Vec<String>> {
    self
      .connection
      .table_names()
      .execute()
      .await
      .map_err(|e| anyhow!("Failed to list tables: {}", e))
  }

  async fn create_collection(&self, name: &str, dimension: usize) -> Result<()> {
    self
      .connection
      .create_empty_table(name, knowledge_schema(dimension))
      .execute()
      .await
      .map_err(|e| anyhow!("Failed to create table '{}': {}", name, e))?;

    scribe::info!("Created table '{name}' ({dimension} dimensions, cosine)");
    Ok(())
  }

  async fn upsert(&self, collection: &str, points: Vec<IndexedPoint>) -> Result<()> {
    if points.is_empty() {
      return Ok(());
    }

    let table = self.open_table(collection).await?;
    let dimension = dimension_from_schema(&table.schema().await?)?;
    let batch = points_to_batch(&points, dimension)?;
    let schema = batch.schema();
    let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

    let mut merge = table.merge_insert(&[ID_COLUMN]);
    merge.when_matched_update_all(None).when_not_matched_insert_all();
    merge
      .execute(Box::new(reader))
      .await
      .map_err(|e| anyhow!("Failed to upsert into '{}': {}", collection, e))?;

    scribe::verbose!("Upserted {} points into '{collection}'", points.len());
    Ok(())
  }

  async fn query(&self, collection: &str, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
    if limit == 0 {
      return Ok(Vec::new());
    }
    let table = self.open_table(collection).await?;
    search_nearest(&table, vector, limit).await
  }

  async fn point_count(&self, collection: &str) -> Result<usize> {
    let table = self.open_table(collection).await?;
    table.count_rows(None).await.map_err(|e| anyhow!("Failed to count rows in '{}': {}", collection, e))
  }
}
