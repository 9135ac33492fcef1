use crate::{
  config::{CsvConfig, FS_DEFAULT_KEY},
  error::{
    BlitzwingError,
    BlitzwingErrorKind::{FileSystemError, LockError, SessionStopped},
    Result,
  },
  frame::DataFrame,
  reader::DataFrameReader,
};
use arrow::{datatypes::SchemaRef, record_batch::RecordBatch};
use failure::ResultExt;
use hdfs_rs::{
  config::{ConfigRef, Configuration},
  fs::{make_file_system, FileSystemRef},
  local::LocalFileSystem,
};
use log::{Level, LevelFilter};
use regex::Regex;
use std::{
  fmt::{Display, Formatter},
  str::FromStr,
  sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
  },
  thread,
};
use uuid::Uuid;

pub const DEFAULT_MASTER: &'static str = "local";
pub const DEFAULT_APP_NAME: &'static str = "blitzwing";

lazy_static! {
  static ref LOCAL_MASTER_REGEX: Regex =
    Regex::new(r"^local\[([0-9]+|\*)\]$").expect("Local master pattern must compile");
  static ref ACTIVE_SESSION: Mutex<Option<Session>> = Mutex::new(None);
}

/// Where a session runs its work. Only in-process workers are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Master {
  Local { threads: usize },
}

impl Master {
  pub fn parallelism(&self) -> usize {
    match self {
      Master::Local { threads } => *threads,
    }
  }
}

impl FromStr for Master {
  type Err = BlitzwingError;

  fn from_str(s: &str) -> Result<Self> {
    let s = s.trim();
    if s == DEFAULT_MASTER {
      return Ok(Master::Local { threads: 1 });
    }

    let captures = match LOCAL_MASTER_REGEX.captures(s) {
      Some(c) => c,
      None => return Err(invalid_arg!("Could not parse master url: [{}]", s)),
    };
    let threads = match &captures[1] {
      "*" => thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
      n => n.parse::<usize>().map_err(|_| invalid_arg!("Illegal thread count in master [{}]", s))?,
    };
    if threads == 0 {
      return Err(invalid_arg!("Master [{}] asks for zero threads", s));
    }
    Ok(Master::Local { threads })
  }
}

impl Display for Master {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    match self {
      Master::Local { threads: 1 } => write!(f, "{}", DEFAULT_MASTER),
      Master::Local { threads } => write!(f, "local[{}]", threads),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
  All,
  Trace,
  Debug,
  Info,
  Warn,
  Error,
  Fatal,
  Off,
}

fn filter_from_usize(value: usize) -> LevelFilter {
  match value {
    0 => LevelFilter::Off,
    1 => LevelFilter::Error,
    2 => LevelFilter::Warn,
    3 => LevelFilter::Info,
    4 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  }
}

impl LogLevel {
  pub fn level_filter(&self) -> LevelFilter {
    match self {
      LogLevel::All | LogLevel::Trace => LevelFilter::Trace,
      LogLevel::Debug => LevelFilter::Debug,
      LogLevel::Info => LevelFilter::Info,
      LogLevel::Warn => LevelFilter::Warn,
      LogLevel::Error | LogLevel::Fatal => LevelFilter::Error,
      LogLevel::Off => LevelFilter::Off,
    }
  }
}

impl FromStr for LogLevel {
  type Err = BlitzwingError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_uppercase().as_str() {
      "ALL" => Ok(LogLevel::All),
      "TRACE" => Ok(LogLevel::Trace),
      "DEBUG" => Ok(LogLevel::Debug),
      "INFO" => Ok(LogLevel::Info),
      "WARN" => Ok(LogLevel::Warn),
      "ERROR" => Ok(LogLevel::Error),
      "FATAL" => Ok(LogLevel::Fatal),
      "OFF" => Ok(LogLevel::Off),
      _ => Err(invalid_arg!(
        "Supplied level {} did not match one of: ALL, DEBUG, ERROR, FATAL, INFO, OFF, TRACE, WARN",
        s
      )),
    }
  }
}

struct SessionState {
  app_id: String,
  app_name: String,
  master: Master,
  config: ConfigRef,
  csv_config: CsvConfig,
  fs: FileSystemRef,
  // Verbosity of the engine's own records, stored as a `LevelFilter`.
  log_level: AtomicUsize,
  stopped: AtomicBool,
}

/// Handle to an engine session. Clones share the same session; it stays alive until `stop`.
#[derive(Clone)]
pub struct Session {
  state: Arc<SessionState>,
}

impl Session {
  pub fn builder() -> SessionBuilder {
    SessionBuilder::new()
  }

  pub fn app_id(&self) -> &str {
    &self.state.app_id
  }

  pub fn app_name(&self) -> &str {
    &self.state.app_name
  }

  pub fn master(&self) -> Master {
    self.state.master
  }

  pub fn parallelism(&self) -> usize {
    self.state.master.parallelism()
  }

  pub fn config(&self) -> &ConfigRef {
    &self.state.config
  }

  pub fn csv_config(&self) -> CsvConfig {
    self.state.csv_config
  }

  pub fn file_system(&self) -> &FileSystemRef {
    &self.state.fs
  }

  pub fn read(&self) -> DataFrameReader {
    DataFrameReader::new(self.clone())
  }

  pub fn create_data_frame(&self, schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<DataFrame> {
    self.ensure_active()?;
    for batch in &batches {
      if batch.schema() != schema {
        return Err(invalid_arg!("Batch schema {:?} does not match {:?}", batch.schema(), schema));
      }
    }
    Ok(DataFrame::new(self.clone(), schema, batches))
  }

  /// Sets the verbosity of the engine's own records. Records of other components are untouched.
  pub fn set_log_level(&self, level: &str) -> Result<()> {
    let level: LogLevel = level.parse()?;
    self.state.log_level.store(level.level_filter() as usize, Ordering::SeqCst);
    engine_log!(self, Level::Debug, "Log level of session {} set to {:?}", self.app_id(), level);
    Ok(())
  }

  pub fn log_level(&self) -> LevelFilter {
    filter_from_usize(self.state.log_level.load(Ordering::SeqCst))
  }

  pub fn log_enabled(&self, level: Level) -> bool {
    level <= self.log_level()
  }

  pub fn is_stopped(&self) -> bool {
    self.state.stopped.load(Ordering::SeqCst)
  }

  pub fn ensure_active(&self) -> Result<()> {
    if self.is_stopped() {
      Err(SessionStopped(self.app_id().to_string()).into())
    } else {
      Ok(())
    }
  }

  /// Stops the session; later calls are no-ops.
  pub fn stop(&self) {
    if self.state.stopped.swap(true, Ordering::SeqCst) {
      engine_log!(self, Level::Debug, "Session {} already stopped", self.app_id());
      return;
    }

    match ACTIVE_SESSION.lock() {
      Ok(mut active) => {
        if active.as_ref().map(|s| s.same_session(self)).unwrap_or(false) {
          *active = None;
        }
      }
      Err(e) => warn!("Active session mutex lock error: {}", e),
    }
    engine_log!(self, Level::Info, "Stopped session {} ({})", self.app_name(), self.app_id());
  }

  pub fn same_session(&self, other: &Session) -> bool {
    Arc::ptr_eq(&self.state, &other.state)
  }

  pub fn active() -> Option<Session> {
    ACTIVE_SESSION.lock().ok().and_then(|s| s.clone())
  }
}

impl std::fmt::Debug for Session {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    f.debug_struct("Session")
      .field("app_id", &self.state.app_id)
      .field("app_name", &self.state.app_name)
      .field("master", &self.state.master)
      .field("log_level", &self.log_level())
      .field("stopped", &self.is_stopped())
      .finish()
  }
}

pub struct SessionBuilder {
  master: String,
  app_name: String,
  log_level: Option<String>,
  config: Configuration,
  fs: Option<FileSystemRef>,
}

impl SessionBuilder {
  pub fn new() -> Self {
    Self {
      master: DEFAULT_MASTER.to_string(),
      app_name: DEFAULT_APP_NAME.to_string(),
      log_level: None,
      config: Configuration::new(),
      fs: None,
    }
  }

  pub fn master<S: Into<String>>(mut self, master: S) -> Self {
    self.master = master.into();
    self
  }

  pub fn app_name<S: Into<String>>(mut self, app_name: S) -> Self {
    self.app_name = app_name.into();
    self
  }

  pub fn log_level<S: Into<String>>(mut self, log_level: S) -> Self {
    self.log_level = Some(log_level.into());
    self
  }

  pub fn config<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
    self.config.set(key, value);
    self
  }

  pub fn file_system(mut self, fs: FileSystemRef) -> Self {
    self.fs = Some(fs);
    self
  }

  /// Creates a session that is not registered as the active one.
  pub fn build(self) -> Result<Session> {
    let master: Master = self.master.parse()?;
    let csv_config = CsvConfig::from_config(&self.config)?;
    let config = Arc::new(self.config);

    let fs = match self.fs {
      Some(fs) => fs,
      None => match config.get::<String>(FS_DEFAULT_KEY).context(FileSystemError)? {
        Some(url) => make_file_system(&url, config.clone()).context(FileSystemError)?,
        None => Arc::new(LocalFileSystem::new()),
      },
    };

    let session = Session {
      state: Arc::new(SessionState {
        app_id: format!("app-{}", Uuid::new_v4()),
        app_name: self.app_name,
        master,
        config,
        csv_config,
        fs,
        log_level: AtomicUsize::new(LevelFilter::Trace as usize),
        stopped: AtomicBool::new(false),
      }),
    };

    if let Some(level) = &self.log_level {
      session.set_log_level(level)?;
    }

    engine_log!(
      session,
      Level::Info,
      "Started session {} ({}) on {}",
      session.app_name(),
      session.app_id(),
      session.master()
    );
    Ok(session)
  }

  /// Returns the active session if one is running, otherwise builds and registers a new one.
  pub fn get_or_create(self) -> Result<Session> {
    let mut active = match ACTIVE_SESSION.lock() {
      Ok(active) => active,
      Err(e) => {
        error!("Active session mutex lock error: {}", e);
        return Err(LockError.into());
      }
    };

    if let Some(session) = active.as_ref().filter(|s| !s.is_stopped()) {
      engine_log!(session, Level::Debug, "Reusing active session {}", session.app_id());
      if let Some(level) = &self.log_level {
        session.set_log_level(level)?;
      }
      return Ok(session.clone());
    }

    let session = self.build()?;
    *active = Some(session.clone());
    Ok(session)
  }
}

impl Default for SessionBuilder {
  fn default() -> Self {
    Self::new()
  }
}
