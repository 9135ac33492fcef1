use failure::{Backtrace, Context, Fail};
use serde::Deserialize;
use std::{
  char::ParseCharError,
  fmt::{Display, Formatter},
  num::ParseIntError,
  str::ParseBoolError,
};

#[derive(Debug)]
pub struct HdfsLibError {
  inner: Context<HdfsLibErrorKind>,
}

/// Body of a WebHDFS `RemoteException` response.
#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteErrorInfo {
  pub exception: String,
  #[serde(default)]
  pub java_class_name: String,
  #[serde(default)]
  pub message: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum HdfsLibErrorKind {
  #[fail(display = "Invalid argument: {}", _0)]
  InvalidArgumentError(String),
  #[fail(display = "Io error happened")]
  IoError,
  #[fail(display = "Illegal path string")]
  PathError,
  #[fail(display = "Http request failed: {}", _0)]
  HttpError(String),
  #[fail(display = "Failed to decode json response")]
  JsonError,
  #[fail(display = "File does not exist: {}", _0)]
  FileNotFoundError(String),
  #[fail(display = "Remote error happened: {:?}", _0)]
  RemoteError(RemoteErrorInfo),
  #[fail(display = "Illegal config value: {}", _0)]
  ConfigError(String),
  #[fail(display = "Unsupported file type: {}", _0)]
  UnsupportedFileType(String),
}

impl HdfsLibError {
  pub fn kind(&self) -> &HdfsLibErrorKind {
    self.inner.get_context()
  }

  pub fn is_file_not_found(&self) -> bool {
    match self.kind() {
      HdfsLibErrorKind::FileNotFoundError(_) => true,
      _ => false,
    }
  }
}

impl Display for HdfsLibError {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    Display::fmt(&self.inner, f)
  }
}

impl Fail for HdfsLibError {
  fn cause(&self) -> Option<&dyn Fail> {
    self.inner.cause()
  }

  fn backtrace(&self) -> Option<&Backtrace> {
    self.inner.backtrace()
  }
}

impl From<HdfsLibErrorKind> for HdfsLibError {
  fn from(kind: HdfsLibErrorKind) -> Self {
    Self { inner: Context::new(kind) }
  }
}

impl From<Context<HdfsLibErrorKind>> for HdfsLibError {
  fn from(inner: Context<HdfsLibErrorKind>) -> Self {
    Self { inner }
  }
}

macro_rules! impl_from_parse_error {
  ($($t:ty),*) => {
    $(
      impl From<$t> for HdfsLibError {
        fn from(e: $t) -> Self {
          HdfsLibErrorKind::ConfigError(e.to_string()).into()
        }
      }
    )*
  };
}

impl_from_parse_error!(ParseIntError, ParseBoolError, ParseCharError);

impl From<std::convert::Infallible> for HdfsLibError {
  fn from(e: std::convert::Infallible) -> Self {
    match e {}
  }
}

pub type Result<T> = std::result::Result<T, HdfsLibError>;

#[macro_export]
macro_rules! check_args {
  ($cond:expr) => {
    if !$cond {
      return Err(
        $crate::error::HdfsLibErrorKind::InvalidArgumentError(stringify!($cond).to_string()).into(),
      );
    }
  };
  ($cond:expr, $($args:tt)*) => {
    if !$cond {
      return Err($crate::error::HdfsLibErrorKind::InvalidArgumentError(format!($($args)*)).into());
    }
  };
}
