use crate::{
  error::{BlitzwingErrorKind::ArrowError, Result},
  session::Session,
  writer::DataFrameWriter,
};
use arrow::{
  compute::concat_batches,
  datatypes::SchemaRef,
  record_batch::RecordBatch,
  util::pretty::pretty_format_batches,
};
use failure::ResultExt;
use std::{
  cmp::min,
  fmt::{Debug, Formatter},
};

/// Rows held by a session, as a schema and the batches that share it.
#[derive(Clone, new)]
pub struct DataFrame {
  session: Session,
  schema: SchemaRef,
  batches: Vec<RecordBatch>,
}

impl DataFrame {
  pub fn session(&self) -> &Session {
    &self.session
  }

  pub fn schema(&self) -> &SchemaRef {
    &self.schema
  }

  pub fn columns(&self) -> Vec<String> {
    self.schema.fields().iter().map(|f| f.name().clone()).collect()
  }

  pub fn count(&self) -> usize {
    self.batches.iter().map(|b| b.num_rows()).sum()
  }

  pub fn batches(&self) -> &[RecordBatch] {
    &self.batches
  }

  /// All rows in one batch.
  pub fn collect(&self) -> Result<RecordBatch> {
    Ok(concat_batches(&self.schema, &self.batches).context(ArrowError)?)
  }

  /// Table rendering of the first `num_rows` rows.
  pub fn show_string(&self, num_rows: usize) -> Result<String> {
    let mut remaining = num_rows;
    let mut head = Vec::new();
    for batch in &self.batches {
      if remaining == 0 {
        break;
      }
      let len = min(remaining, batch.num_rows());
      head.push(batch.slice(0, len));
      remaining -= len;
    }
    if head.is_empty() {
      head.push(RecordBatch::new_empty(self.schema.clone()));
    }

    let table = pretty_format_batches(&head).context(ArrowError)?.to_string();
    let total = self.count();
    if total > num_rows {
      Ok(format!("{}\nonly showing top {} of {} rows", table, num_rows, total))
    } else {
      Ok(table)
    }
  }

  pub fn write(&self) -> DataFrameWriter<'_> {
    DataFrameWriter::new(self)
  }
}

impl Debug for DataFrame {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    f.debug_struct("DataFrame")
      .field("session", &self.session.app_id())
      .field("columns", &self.columns())
      .field("rows", &self.count())
      .field("batches", &self.batches.len())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use crate::session::Session;
  use arrow::{
    array::{ArrayRef, Int64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
  };
  use std::sync::Arc;

  fn batch(schema: &Arc<Schema>, ids: Vec<i64>, names: Vec<&str>) -> RecordBatch {
    let columns: Vec<ArrayRef> =
      vec![Arc::new(Int64Array::from(ids)), Arc::new(StringArray::from(names))];
    RecordBatch::try_new(schema.clone(), columns).unwrap()
  }

  #[test]
  fn test_frame_accessors() {
    let schema = Arc::new(Schema::new(vec![
      Field::new("id", DataType::Int64, true),
      Field::new("name", DataType::Utf8, true),
    ]));
    let session = Session::builder().build().unwrap();
    let frame = session
      .create_data_frame(
        schema.clone(),
        vec![batch(&schema, vec![1, 2], vec!["a", "b"]), batch(&schema, vec![3], vec!["c"])],
      )
      .unwrap();

    assert_eq!(vec!["id".to_string(), "name".to_string()], frame.columns());
    assert_eq!(3, frame.count());
    assert_eq!(2, frame.batches().len());
    assert_eq!(3, frame.collect().unwrap().num_rows());

    let shown = frame.show_string(2).unwrap();
    assert!(shown.contains("| id | name |"));
    assert!(shown.contains("| 2  | b    |"));
    assert!(!shown.contains("| 3  | c    |"));
    assert!(shown.ends_with("only showing top 2 of 3 rows"));

    assert!(format!("{:?}", frame).contains("rows: 3"));
  }

  #[test]
  fn test_mismatched_batch_rejected() {
    let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, true)]));
    let other = Arc::new(Schema::new(vec![
      Field::new("id", DataType::Int64, true),
      Field::new("name", DataType::Utf8, true),
    ]));
    let session = Session::builder().build().unwrap();
    assert!(session
      .create_data_frame(schema, vec![batch(&other, vec![1], vec!["a"])])
      .is_err());
  }

  #[test]
  fn test_empty_frame_shows_header() {
    let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, true)]));
    let session = Session::builder().build().unwrap();
    let frame = session.create_data_frame(schema, vec![]).unwrap();
    assert_eq!(0, frame.count());
    assert!(frame.show_string(20).unwrap().contains("| id |"));
  }
}
