use crate::{
  config::CsvConfig,
  error::{
    BlitzwingError,
    BlitzwingErrorKind::{ArrowError, FatalError, FileSystemError},
    Result,
  },
  frame::DataFrame,
  session::Session,
};
use arrow::{
  csv::{reader::Format, ReaderBuilder},
  datatypes::{DataType, Field, Schema, SchemaRef},
  record_batch::RecordBatch,
};
use failure::ResultExt;
use log::Level;
use std::{cmp::min, io::Cursor, sync::Arc, thread};

/// Files whose name starts with one of these are bookkeeping, not data.
const HIDDEN_FILE_PREFIXES: [char; 2] = ['_', '.'];

pub(crate) fn is_hidden(name: &str) -> bool {
  name.starts_with(&HIDDEN_FILE_PREFIXES[..])
}

/// Loads csv files into a `DataFrame`. Obtained from `Session::read`.
pub struct DataFrameReader {
  session: Session,
  infer_schema: bool,
  header: bool,
}

impl DataFrameReader {
  pub(crate) fn new(session: Session) -> Self {
    Self { session, infer_schema: false, header: false }
  }

  /// Detect column types from the data; otherwise every column is read as a string.
  pub fn option_infer_schema(mut self, infer_schema: bool) -> Self {
    self.infer_schema = infer_schema;
    self
  }

  /// Treat the first line of each file as column names.
  pub fn header(mut self, header: bool) -> Self {
    self.header = header;
    self
  }

  /// Reads the csv file at `path`, or every data file directly under the directory `path`.
  pub fn csv(&self, path: &str) -> Result<DataFrame> {
    self.session.ensure_active()?;
    let files = self.resolve_files(path)?;
    engine_log!(self.session, Level::Debug, "Reading csv files: {:?}", files);

    let fs = self.session.file_system();
    let mut contents = Vec::with_capacity(files.len());
    for file in &files {
      let content = fs.read_to_end(file).context(FileSystemError)?;
      // Empty files carry neither a schema nor rows.
      if !content.is_empty() {
        contents.push((file.as_str(), content));
      }
    }

    if contents.is_empty() {
      return Ok(DataFrame::new(self.session.clone(), Arc::new(Schema::empty()), vec![]));
    }

    let csv_config = self.session.csv_config();
    let schemas = contents
      .iter()
      .map(|(_, content)| self.file_schema(content, csv_config))
      .collect::<Result<Vec<Schema>>>()?;
    let names = contents.iter().map(|(file, _)| *file).collect::<Vec<&str>>();
    let schema = Arc::new(merge_schemas(&names, &schemas)?);

    let batches = self.parse_all(&contents, &schema, csv_config)?;
    engine_log!(
      self.session,
      Level::Info,
      "Read {} rows with columns {:?} from {} files under {}",
      batches.iter().map(|b| b.num_rows()).sum::<usize>(),
      schema.fields().iter().map(|f| f.name()).collect::<Vec<_>>(),
      contents.len(),
      path
    );
    Ok(DataFrame::new(self.session.clone(), schema, batches))
  }

  fn resolve_files(&self, path: &str) -> Result<Vec<String>> {
    let fs = self.session.file_system();
    let status = match fs.try_get_file_status(path).context(FileSystemError)? {
      Some(status) => status,
      None => return Err(analysis_err!("Path does not exist: {}", path)),
    };

    if status.is_file() {
      return Ok(vec![path.to_string()]);
    }
    if !status.is_dir() {
      return Err(analysis_err!("Cannot read {} at {}", status.file_type(), path));
    }

    let mut files = fs
      .list_status(path)
      .context(FileSystemError)?
      .into_iter()
      .filter(|s| s.is_file() && !is_hidden(s.name()))
      .map(|s| s.path().to_string())
      .collect::<Vec<String>>();
    files.sort();

    if files.is_empty() {
      return Err(analysis_err!("Unable to infer schema for CSV at {}. It must be specified manually", path));
    }
    Ok(files)
  }

  fn file_schema(&self, content: &[u8], csv_config: CsvConfig) -> Result<Schema> {
    let format = Format::default().with_header(self.header).with_delimiter(csv_config.delimiter());
    let (inferred, _) = format
      .infer_schema(Cursor::new(content), csv_config.infer_max_records())
      .context(ArrowError)?;

    let fields = inferred
      .fields()
      .iter()
      .enumerate()
      .map(|(idx, field)| {
        let name = if self.header { field.name().clone() } else { format!("_c{}", idx) };
        let data_type = if self.infer_schema { field.data_type().clone() } else { DataType::Utf8 };
        Field::new(name, data_type, true)
      })
      .collect::<Vec<Field>>();
    Ok(Schema::new(fields))
  }

  fn parse_all(
    &self,
    contents: &[(&str, Vec<u8>)],
    schema: &SchemaRef,
    csv_config: CsvConfig,
  ) -> Result<Vec<RecordBatch>> {
    let workers = min(self.session.parallelism(), contents.len()).max(1);
    let chunk_size = (contents.len() + workers - 1) / workers;
    let header = self.header;
    let session = &self.session;

    let results = thread::scope(|scope| {
      let handles = contents
        .chunks(chunk_size)
        .map(|chunk| {
          scope.spawn(move || -> Result<Vec<RecordBatch>> {
            let mut batches = Vec::new();
            for (file, content) in chunk {
              engine_log!(session, Level::Debug, "Parsing {} ({} bytes)", file, content.len());
              batches.extend(parse_file(content, schema, header, csv_config)?);
            }
            Ok(batches)
          })
        })
        .collect::<Vec<_>>();

      handles
        .into_iter()
        .map(|handle| {
          handle.join().unwrap_or_else(|_| {
            Err(BlitzwingError::from(FatalError("Csv parsing thread panicked".to_string())))
          })
        })
        .collect::<Vec<Result<Vec<RecordBatch>>>>()
    });

    let mut batches = Vec::new();
    for result in results {
      batches.extend(result?);
    }
    Ok(batches)
  }
}

fn parse_file(
  content: &[u8],
  schema: &SchemaRef,
  header: bool,
  csv_config: CsvConfig,
) -> Result<Vec<RecordBatch>> {
  let reader = ReaderBuilder::new(schema.clone())
    .with_header(header)
    .with_delimiter(csv_config.delimiter())
    .with_batch_size(csv_config.batch_size())
    .build(Cursor::new(content))
    .context(ArrowError)?;

  let mut batches = Vec::new();
  for batch in reader {
    batches.push(batch.context(ArrowError)?);
  }
  Ok(batches)
}

/// Common type of one column seen in two files.
fn widen(left: &DataType, right: &DataType) -> DataType {
  match (left, right) {
    (l, r) if l == r => l.clone(),
    (DataType::Null, other) | (other, DataType::Null) => other.clone(),
    (l, r) if l.is_numeric() && r.is_numeric() => DataType::Float64,
    _ => DataType::Utf8,
  }
}

/// One schema for files read together: names of the first file, per column widened types.
fn merge_schemas(files: &[&str], schemas: &[Schema]) -> Result<Schema> {
  let first = match schemas.first() {
    Some(s) => s,
    None => return Ok(Schema::empty()),
  };

  for (file, schema) in files.iter().zip(schemas).skip(1) {
    if schema.fields().len() != first.fields().len() {
      return Err(analysis_err!(
        "{} has {} columns while {} has {}",
        file,
        schema.fields().len(),
        files[0],
        first.fields().len()
      ));
    }
  }

  let fields = first
    .fields()
    .iter()
    .enumerate()
    .map(|(idx, field)| {
      let data_type = schemas
        .iter()
        .skip(1)
        .fold(field.data_type().clone(), |acc, s| widen(&acc, s.field(idx).data_type()));
      Field::new(field.name().clone(), data_type, true)
    })
    .collect::<Vec<Field>>();
  Ok(Schema::new(fields))
}
