//! Arrow RecordBatch conversion for knowledge points

use anyhow::{anyhow, Result};
use arrow::array::{Array, FixedSizeListBuilder, Float32Builder, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

use crate::index::{IndexedPoint, Payload};

pub const ID_COLUMN: &str = "id";
pub const TEXT_COLUMN: &str = "text";
pub const PAYLOAD_COLUMN: &str = "payload";
pub const VECTOR_COLUMN: &str = "vector";

/// Schema of a knowledge table whose vectors have `dimension` entries
pub fn knowledge_schema(dimension: usize) -> SchemaRef {
  Arc::new(Schema::new(vec![
    Field::new(ID_COLUMN, DataType::UInt64, false),
    Field::new(TEXT_COLUMN, DataType::Utf8, false),
    Field::new(PAYLOAD_COLUMN, DataType::Utf8, false),
    Field::new(
      VECTOR_COLUMN,
      DataType::FixedSizeList(
        Arc::new(Field::new("item", DataType::Float32, true)),
        dimension as i32,
      ),
      false,
    ),
  ]))
}

/// Read the vector dimension back out of a table schema
pub fn dimension_from_schema(schema: &Schema) -> Result<usize> {
  let field = schema
    .field_with_name(VECTOR_COLUMN)
    .map_err(|_| anyhow!("Table has no '{}' column", VECTOR_COLUMN))?;

  match field.data_type() {
    DataType::FixedSizeList(_, size) => Ok(*size as usize),
    other => Err(anyhow!("Column '{}' has unexpected type {:?}", VECTOR_COLUMN, other)),
  }
}

/// Convert points to a RecordBatch matching [`knowledge_schema`]
pub fn points_to_batch(points: &[IndexedPoint], dimension: usize) -> Result<RecordBatch> {
  if points.is_empty() {
    return Err(anyhow!("Cannot create RecordBatch from empty points"));
  }
  validate_dimensions(points, dimension)?;

  let ids = UInt64Array::from(points.iter().map(|p| p.id).collect::<Vec<_>>());
  let texts = StringArray::from(points.iter().map(|p| payload_text(&p.payload)).collect::<Vec<_>>());
  let payloads = StringArray::from(
    points.iter().map(|p| serde_json::to_string(&p.payload)).collect::<Result<Vec<_>, _>>()?,
  );
  let vectors = build_vector_array(points, dimension);

  let columns: Vec<Arc<dyn Array>> =
    vec![Arc::new(ids), Arc::new(texts), Arc::new(payloads), Arc::new(vectors)];

  RecordBatch::try_new(knowledge_schema(dimension), columns)
    .map_err(|e| anyhow!("Failed to create RecordBatch: {}", e))
}

fn validate_dimensions(points: &[IndexedPoint], dimension: usize) -> Result<()> {
  match points.iter().find(|p| p.vector.len() != dimension) {
    Some(bad) => Err(anyhow!(
      "Point {} has {} dimensions, table expects {}",
      bad.id,
      bad.vector.len(),
      dimension
    )),
    None => Ok(()),
  }
}

/// The `text` column duplicates the payload's text for inspection with other tools
fn payload_text(payload: &Payload) -> &str {
  payload.get("text").and_then(|v| v.as_str()).unwrap_or_default()
}

fn build_vector_array(points: &[IndexedPoint], dimension: usize) -> arrow::array::FixedSizeListArray {
  let mut builder =
    FixedSizeListBuilder::new(Float32Builder::with_capacity(dimension * points.len()), dimension as i32);

  for point in points {
    builder.values().append_slice(&point.vector);
    builder.append(true);
  }

  builder.finish()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn point(id: u64, vector: Vec<f32>) -> IndexedPoint {
    let mut payload = Payload::new();
    payload.insert("text".to_string(), json!(format!("fact {id}")));
    payload.insert("grade".to_string(), json!("grade_6"));
    IndexedPoint { id, vector, payload }
  }

  #[test]
  fn batch_has_one_row_per_point() {
    let batch = points_to_batch(&[point(1, vec![0.1, 0.2]), point(2, vec![0.3, 0.4])], 2).unwrap();
    assert_eq!(batch.num_rows(), 2);
    assert_eq!(batch.num_columns(), 4);
  }

  #[test]
  fn payload_column_is_json() {
    let batch = points_to_batch(&[point(9, vec![1.0])], 1).unwrap();
    let payloads = batch.column_by_name(PAYLOAD_COLUMN).unwrap();
    let payloads = payloads.as_any().downcast_ref::<StringArray>().unwrap();
    let decoded: Payload = serde_json::from_str(payloads.value(0)).unwrap();
    assert_eq!(decoded["grade"], json!("grade_6"));
    assert_eq!(decoded["text"], json!("fact 9"));
  }

  #[test]
  fn dimension_round_trips_through_schema() {
    assert_eq!(dimension_from_schema(&knowledge_schema(384)).unwrap(), 384);
  }

  #[test]
  fn mismatched_vector_is_rejected() {
    assert!(points_to_batch(&[point(1, vec![0.1])], 2).is_err());
  }

  #[test]
  fn empty_points_are_rejected() {
    assert!(points_to_batch(&[], 2).is_err());
  }
}
