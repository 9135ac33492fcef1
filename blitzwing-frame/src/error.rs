use failure::{Backtrace, Context, Fail};
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub struct BlitzwingError {
  inner: Context<BlitzwingErrorKind>,
}

#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum BlitzwingErrorKind {
  #[fail(display = "Arrow error happened")]
  ArrowError,
  #[fail(display = "IO error")]
  IoError,
  #[fail(display = "File system error happened")]
  FileSystemError,
  /// The query can not be resolved against the data: missing paths, unreadable layouts.
  #[fail(display = "Analysis error: {}", _0)]
  AnalysisError(String),
  #[fail(display = "Invalid argument: {}", _0)]
  InvalidArgumentError(String),
  #[fail(display = "Session {} has been stopped", _0)]
  SessionStopped(String),
  #[fail(display = "Lock status is incorrect")]
  LockError,
  #[fail(display = "Fatal error happened: {}", _0)]
  FatalError(String),
}

impl BlitzwingError {
  pub fn kind(&self) -> &BlitzwingErrorKind {
    self.inner.get_context()
  }

  pub fn is_analysis_error(&self) -> bool {
    match self.kind() {
      BlitzwingErrorKind::AnalysisError(_) => true,
      _ => false,
    }
  }
}

impl Display for BlitzwingError {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    Display::fmt(&self.inner, f)
  }
}

impl Fail for BlitzwingError {
  fn cause(&self) -> Option<&dyn Fail> {
    self.inner.cause()
  }

  fn backtrace(&self) -> Option<&Backtrace> {
    self.inner.backtrace()
  }
}

impl From<BlitzwingErrorKind> for BlitzwingError {
  fn from(kind: BlitzwingErrorKind) -> Self {
    Self { inner: Context::new(kind) }
  }
}

impl From<Context<BlitzwingErrorKind>> for BlitzwingError {
  fn from(inner: Context<BlitzwingErrorKind>) -> Self {
    Self { inner }
  }
}

pub type Result<T> = std::result::Result<T, BlitzwingError>;

macro_rules! analysis_err {
  ($fmt:expr) => {
    crate::error::BlitzwingError::from(crate::error::BlitzwingErrorKind::AnalysisError($fmt.to_owned()))
  };
  ($fmt:expr, $($args:tt)*) => {
    crate::error::BlitzwingError::from(crate::error::BlitzwingErrorKind::AnalysisError(format!($fmt, $($args)*)))
  };
}

macro_rules! invalid_arg {
  ($fmt:expr) => {
    crate::error::BlitzwingError::from(crate::error::BlitzwingErrorKind::InvalidArgumentError($fmt.to_owned()))
  };
  ($fmt:expr, $($args:tt)*) => {
    crate::error::BlitzwingError::from(crate::error::BlitzwingErrorKind::InvalidArgumentError(format!($fmt, $($args)*)))
  };
}

/// Renders the error, its cause chain and the captured backtrace, if any.
pub fn error_report(e: &dyn Fail) -> String {
  let mut report = e.to_string();
  let mut cause = e.cause();
  while let Some(c) = cause {
    report.push_str("\nCaused by: ");
    report.push_str(&c.to_string());
    cause = c.cause();
  }
  if let Some(backtrace) = e.backtrace() {
    let rendered = backtrace.to_string();
    if !rendered.is_empty() {
      report.push_str("\nBacktrace:\n");
      report.push_str(&rendered);
    }
  }
  report
}
