use crate::{
  error::{error_report, Result},
  frame::DataFrame,
  session::{Session, DEFAULT_APP_NAME},
  writer::SaveMode,
};

pub const CSV_SUFFIX: &'static str = ".csv";
pub const DEFAULT_LOG_LEVEL: &'static str = "ERROR";
pub const DEFAULT_SAVE_MODE: &'static str = "overwrite";

/// Whether `file` ends with `suffix`, compared case sensitively.
pub fn check_file_suffix(file: &str, suffix: &str) -> bool {
  file.ends_with(suffix)
}

/// Reads and writes csv data through a session.
///
/// Failures never escape: they are logged and reads come back as `None`.
pub struct CsvClient {
  session: Session,
}

impl CsvClient {
  /// Attaches to the running session, or starts one on `master`.
  pub fn new(master: &str, log_level: &str) -> Result<Self> {
    let session = Session::builder()
      .master(master)
      .app_name(DEFAULT_APP_NAME)
      .log_level(log_level)
      .get_or_create()?;
    Ok(Self::with_session(session))
  }

  pub fn with_session(session: Session) -> Self {
    Self { session }
  }

  pub fn session(&self) -> &Session {
    &self.session
  }

  pub fn read_data(&self, path: &str, infer_schema: bool, header: bool) -> Option<DataFrame> {
    if !check_file_suffix(path, CSV_SUFFIX) {
      warn!("Incorrect file type: {}, expected a {} file", path, CSV_SUFFIX);
      return None;
    }

    match self.session.read().option_infer_schema(infer_schema).header(header).csv(path) {
      Ok(frame) => Some(frame),
      Err(e) if e.is_analysis_error() => {
        warn!("Failed to read {}: {}", path, e);
        None
      }
      Err(e) => {
        error!("Failed to read {}: {}", path, error_report(&e));
        None
      }
    }
  }

  /// Reads with a header line and inferred column types.
  pub fn read_csv(&self, path: &str) -> Option<DataFrame> {
    self.read_data(path, true, true)
  }

  pub fn write_data(&self, frame: &DataFrame, path: &str, header: bool, mode: &str) {
    if !check_file_suffix(path, CSV_SUFFIX) {
      warn!("Incorrect file type: {}, expected a {} file", path, CSV_SUFFIX);
      return;
    }

    let result = mode
      .parse::<SaveMode>()
      .and_then(|mode| frame.write().mode(mode).header(header).csv(path));
    if let Err(e) = result {
      error!("Failed to write {}: {}", path, error_report(&e));
    }
  }

  /// Writes with a header line, replacing anything already at `path`.
  pub fn write_csv(&self, frame: &DataFrame, path: &str) {
    self.write_data(frame, path, true, DEFAULT_SAVE_MODE)
  }

  /// Stops the session. Frames created through it can no longer be written.
  pub fn close(&self) {
    self.session.stop();
    info!("Closed csv client of application {}", self.session.app_id());
  }
}
