use crate::{
  error::{
    BlitzwingError,
    BlitzwingErrorKind::{ArrowError, FileSystemError},
    Result,
  },
  frame::DataFrame,
};
use arrow::{csv::WriterBuilder, record_batch::RecordBatch};
use failure::ResultExt;
use hdfs_rs::fs::path::join_path;
use log::Level;
use std::{
  fmt::{Display, Formatter},
  str::FromStr,
};
use uuid::Uuid;

/// Marker written once every part file of an output directory is complete.
pub const SUCCESS_FILE_NAME: &'static str = "_SUCCESS";

/// What to do when the output path already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
  Overwrite,
  Append,
  Ignore,
  ErrorIfExists,
}

impl Default for SaveMode {
  fn default() -> Self {
    SaveMode::ErrorIfExists
  }
}

impl FromStr for SaveMode {
  type Err = BlitzwingError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "overwrite" => Ok(SaveMode::Overwrite),
      "append" => Ok(SaveMode::Append),
      "ignore" => Ok(SaveMode::Ignore),
      "error" | "errorifexists" | "default" => Ok(SaveMode::ErrorIfExists),
      _ => Err(invalid_arg!(
        "Unknown save mode: {}. Accepted save modes are 'overwrite', 'append', 'ignore', 'error', 'errorifexists'.",
        s
      )),
    }
  }
}

impl Display for SaveMode {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    let name = match self {
      SaveMode::Overwrite => "overwrite",
      SaveMode::Append => "append",
      SaveMode::Ignore => "ignore",
      SaveMode::ErrorIfExists => "errorifexists",
    };
    write!(f, "{}", name)
  }
}

/// Saves a `DataFrame` as a directory of csv part files. Obtained from `DataFrame::write`.
pub struct DataFrameWriter<'a> {
  frame: &'a DataFrame,
  mode: SaveMode,
  header: bool,
}

impl<'a> DataFrameWriter<'a> {
  pub(crate) fn new(frame: &'a DataFrame) -> Self {
    Self { frame, mode: SaveMode::default(), header: false }
  }

  pub fn mode(mut self, mode: SaveMode) -> Self {
    self.mode = mode;
    self
  }

  /// Write column names as the first line of every part file.
  pub fn header(mut self, header: bool) -> Self {
    self.header = header;
    self
  }

  pub fn csv(&self, path: &str) -> Result<()> {
    let session = self.frame.session();
    session.ensure_active()?;
    let fs = session.file_system();

    if fs.try_get_file_status(path).context(FileSystemError)?.is_some() {
      match self.mode {
        SaveMode::ErrorIfExists => return Err(analysis_err!("path {} already exists.", path)),
        SaveMode::Ignore => {
          engine_log!(session, Level::Info, "Path {} already exists, skip writing in {} mode", path, self.mode);
          return Ok(());
        }
        SaveMode::Overwrite => {
          engine_log!(session, Level::Debug, "Deleting existing output {}", path);
          fs.delete(path, true).context(FileSystemError)?;
        }
        SaveMode::Append => {}
      }
    }

    if !fs.mkdirs(path).context(FileSystemError)? {
      return Err(analysis_err!("Unable to create output directory {}", path));
    }

    // An empty frame still yields one part file so the schema survives.
    let empty = [RecordBatch::new_empty(self.frame.schema().clone())];
    let batches = if self.frame.batches().is_empty() { &empty[..] } else { self.frame.batches() };

    let job_id = Uuid::new_v4();
    for (idx, batch) in batches.iter().enumerate() {
      let part = join_path(path, &format!("part-{:05}-{}-c000.csv", idx, job_id));
      let data = encode_batch(batch, self.header, session.csv_config().delimiter())?;
      engine_log!(session, Level::Debug, "Writing {} rows to {}", batch.num_rows(), part);
      fs.create(&part, &data, false).context(FileSystemError)?;
    }
    fs.create(&join_path(path, SUCCESS_FILE_NAME), &[], true).context(FileSystemError)?;

    engine_log!(
      session,
      Level::Info,
      "Wrote {} rows in {} files to {} ({} mode)",
      self.frame.count(),
      batches.len(),
      path,
      self.mode
    );
    Ok(())
  }
}

fn encode_batch(batch: &RecordBatch, header: bool, delimiter: u8) -> Result<Vec<u8>> {
  let mut buffer = Vec::new();
  {
    let mut writer = WriterBuilder::new().with_header(header).with_delimiter(delimiter).build(&mut buffer);
    writer.write(batch).context(ArrowError)?;
  }
  Ok(buffer)
}

#[cfg(test)]
mod tests {
  use super::{encode_batch, SaveMode};
  use arrow::{
    array::{ArrayRef, Int64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
  };
  use std::sync::Arc;

  #[test]
  fn test_parse_save_mode() {
    assert_eq!(SaveMode::Overwrite, "OverWrite".parse().unwrap());
    assert_eq!(SaveMode::Append, "append".parse().unwrap());
    assert_eq!(SaveMode::Ignore, "ignore".parse().unwrap());
    assert_eq!(SaveMode::ErrorIfExists, "error".parse().unwrap());
    assert_eq!(SaveMode::ErrorIfExists, "errorifexists".parse().unwrap());
    assert_eq!(SaveMode::ErrorIfExists, SaveMode::default());
    assert!("replace".parse::<SaveMode>().is_err());
    assert_eq!("overwrite", SaveMode::Overwrite.to_string());
  }

  #[test]
  fn test_encode_batch() {
    let schema = Arc::new(Schema::new(vec![
      Field::new("id", DataType::Int64, true),
      Field::new("name", DataType::Utf8, true),
    ]));
    let columns: Vec<ArrayRef> =
      vec![Arc::new(Int64Array::from(vec![1, 2])), Arc::new(StringArray::from(vec!["a", "b"]))];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

    let with_header = String::from_utf8(encode_batch(&batch, true, b',').unwrap()).unwrap();
    assert_eq!("id,name\n1,a\n2,b\n", with_header);

    let piped = String::from_utf8(encode_batch(&batch, false, b'|').unwrap()).unwrap();
    assert_eq!("1|a\n2|b\n", piped);

    let empty = String::from_utf8(encode_batch(&RecordBatch::new_empty(schema), true, b',').unwrap()).unwrap();
    assert_eq!("id,name\n", empty);
  }
}
