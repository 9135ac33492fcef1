use crate::error::{HdfsLibError, HdfsLibErrorKind::PathError, Result};
use failure::ResultExt;
use std::convert::TryFrom;
use url::Url;

pub const PATH_SEPARATOR: char = '/';

/// A file system endpoint, e.g. `http://namenode:9870`.
#[derive(Debug, Clone)]
pub struct FsPath {
  url: Url,
}

impl FsPath {
  pub fn scheme(&self) -> &str {
    self.url.scheme()
  }

  pub fn host_port(&self) -> String {
    let mut host_port = String::with_capacity(32);
    if let Some(host_str) = self.url.host_str() {
      host_port.push_str(host_str);
    }
    if let Some(port) = self.url.port() {
      host_port.push(':');
      host_port.push_str(port.to_string().as_str());
    }
    host_port
  }

  pub fn user_name(&self) -> Option<&str> {
    Some(self.url.username()).filter(|u| !u.is_empty())
  }
}

impl<'a> TryFrom<&'a str> for FsPath {
  type Error = HdfsLibError;

  fn try_from(value: &'a str) -> Result<Self> {
    let url = Url::parse(value).context(PathError)?;
    Ok(FsPath { url })
  }
}

/// Joins `name` under `base` with exactly one separator between them.
pub fn join_path(base: &str, name: &str) -> String {
  let base = base.trim_end_matches(PATH_SEPARATOR);
  let name = name.trim_start_matches(PATH_SEPARATOR);
  let mut joined = String::with_capacity(base.len() + name.len() + 1);
  joined.push_str(base);
  joined.push(PATH_SEPARATOR);
  joined.push_str(name);
  joined
}

/// Last component of `path`, ignoring trailing separators.
pub fn file_name(path: &str) -> &str {
  let trimmed = path.trim_end_matches(PATH_SEPARATOR);
  match trimmed.rfind(PATH_SEPARATOR) {
    Some(idx) => &trimmed[idx + 1..],
    None => trimmed,
  }
}
