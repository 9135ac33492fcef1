use crate::error::{BlitzwingErrorKind::InvalidArgumentError, Result};
use failure::ResultExt;
use hdfs_rs::config::Configuration;

// Url of the file system sessions read and write through, local disk when unset.
pub const FS_DEFAULT_KEY: &'static str = "fs.defaultFS";

pub const CSV_BATCH_SIZE_KEY: &'static str = "blitzwing.csv.batch.size";
pub const CSV_BATCH_SIZE_DEFAULT: usize = 8192;

// Unset means every record takes part in schema inference.
pub const CSV_INFER_MAX_RECORDS_KEY: &'static str = "blitzwing.csv.infer.max.records";

pub const CSV_DELIMITER_KEY: &'static str = "blitzwing.csv.delimiter";
pub const CSV_DELIMITER_DEFAULT: char = ',';

/// Csv settings resolved from a session's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct CsvConfig {
  #[get_copy = "pub"]
  batch_size: usize,
  #[get_copy = "pub"]
  infer_max_records: Option<usize>,
  #[get_copy = "pub"]
  delimiter: u8,
}

impl Default for CsvConfig {
  fn default() -> Self {
    Self {
      batch_size: CSV_BATCH_SIZE_DEFAULT,
      infer_max_records: None,
      delimiter: CSV_DELIMITER_DEFAULT as u8,
    }
  }
}

impl CsvConfig {
  pub fn from_config(config: &Configuration) -> Result<Self> {
    let batch_size = config
      .get_or(CSV_BATCH_SIZE_KEY, CSV_BATCH_SIZE_DEFAULT)
      .context(InvalidArgumentError(CSV_BATCH_SIZE_KEY.to_string()))?;
    let infer_max_records = config
      .get::<usize>(CSV_INFER_MAX_RECORDS_KEY)
      .context(InvalidArgumentError(CSV_INFER_MAX_RECORDS_KEY.to_string()))?;
    let delimiter = config
      .get_or(CSV_DELIMITER_KEY, CSV_DELIMITER_DEFAULT)
      .context(InvalidArgumentError(CSV_DELIMITER_KEY.to_string()))?;

    if batch_size == 0 {
      return Err(invalid_arg!("{} must be positive", CSV_BATCH_SIZE_KEY));
    }
    if !delimiter.is_ascii() {
      return Err(invalid_arg!("{} must be a single ascii character, got {}", CSV_DELIMITER_KEY, delimiter));
    }

    Ok(Self { batch_size, infer_max_records, delimiter: delimiter as u8 })
  }
}
