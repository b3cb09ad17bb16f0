//! Vector search and result decoding for LanceDB

use anyhow::{anyhow, Result};
use arrow::array::{Array, Float32Array, StringArray, UInt64Array};
use arrow::record_batch::RecordBatch;
use futures::stream::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};

use super::records::{ID_COLUMN, PAYLOAD_COLUMN, VECTOR_COLUMN};
use crate::index::{Payload, ScoredPoint};

const DISTANCE_COLUMN: &str = "_distance";

/// Cosine nearest-neighbour search, most similar first
pub async fn search_nearest(table: &Table, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
  let mut stream = table
    .vector_search(vector)?
    .column(VECTOR_COLUMN)
    .distance_type(DistanceType::Cosine)
    .limit(limit)
    .execute()
    .await
    .map_err(|e| anyhow!("Vector search failed: {}", e))?;

  let mut results = Vec::new();
  while let Some(batch) = stream.next().await {
    let batch = batch.map_err(|e| anyhow!("Error reading batch: {}", e))?;
    results.extend(decode_batch(&batch)?);
  }

  // LanceDB already orders by distance; keep the guarantee across batches
  results.sort_by(|a, b| b.score.total_cmp(&a.score));
  results.truncate(limit);
  Ok(results)
}

/// Decode one result batch into scored points
pub fn decode_batch(batch: &RecordBatch) -> Result<Vec<ScoredPoint>> {
  let ids = column::<UInt64Array>(batch, ID_COLUMN)?;
  let payloads = column::<StringArray>(batch, PAYLOAD_COLUMN)?;
  let distances =
    batch.column_by_name(DISTANCE_COLUMN).and_then(|c| c.as_any().downcast_ref::<Float32Array>());

  (0..batch.num_rows())
    .map(|row| {
      let payload: Payload = serde_json::from_str(payloads.value(row))
        .map_err(|e| anyhow!("Corrupt payload for point {}: {}", ids.value(row), e))?;
      Ok(ScoredPoint {
        id: ids.value(row),
        score: distance_to_similarity(distance_at(distances, row)),
        payload,
      })
    })
    .collect()
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
  batch
    .column_by_name(name)
    .ok_or_else(|| anyhow!("Missing '{}' column", name))?
    .as_any()
    .downcast_ref::<T>()
    .ok_or_else(|| anyhow!("Column '{}' has an unexpected type", name))
}

/// Missing distances count as orthogonal
fn distance_at(distances: Option<&Float32Array>, row: usize) -> f32 {
  match distances {
    Some(array) if row < array.len() && !array.is_null(row) => array.value(row),
    _ => 1.0,
  }
}

/// LanceDB cosine distance is `1 - cosine similarity`
fn distance_to_similarity(distance: f32) -> f32 {
  1.0 - distance
}

#[cfg(test)]
mod tests {
  use super::*;
  use arrow::datatypes::{DataType, Field, Schema};
  use std::sync::Arc;

  fn result_batch(distances: Option<Vec<f32>>) -> RecordBatch {
    let mut fields = vec![
      Field::new(ID_COLUMN, DataType::UInt64, false),
      Field::new(PAYLOAD_COLUMN, DataType::Utf8, false),
    ];
    let mut columns: Vec<Arc<dyn Array>> = vec![
      Arc::new(UInt64Array::from(vec![4, 5])),
      Arc::new(StringArray::from(vec![r#"{"text":"a"}"#, r#"{"text":"b","topic":"tides"}"#])),
    ];
    if let Some(distances) = distances {
      fields.push(Field::new(DISTANCE_COLUMN, DataType::Float32, true));
      columns.push(Arc::new(Float32Array::from(distances)));
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap()
  }

  #[test]
  fn distances_become_similarities() {
    let points = decode_batch(&result_batch(Some(vec![0.0, 0.25]))).unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].id, 4);
    assert!((points[0].score - 1.0).abs() < 1e-6);
    assert!((points[1].score - 0.75).abs() < 1e-6);
    assert_eq!(points[1].payload["topic"], serde_json::json!("tides"));
  }

  #[test]
  fn missing_distance_column_scores_zero() {
    let points = decode_batch(&result_batch(None)).unwrap();
    assert!(points.iter().all(|p| p.score == 0.0));
  }
}
