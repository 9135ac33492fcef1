use crate::{
  config::{ConfigRef, Configuration},
  error::Result,
  fs::{
    file_status::{FileType, DIR_TYPE, FILE_TYPE, SYMLINK_TYPE},
    file_system::FileSystemRef,
    path::{join_path, PATH_SEPARATOR},
  },
  webhdfs::WebHdfsBuilder,
};
use std::{
  fmt::{Display, Formatter},
  sync::Arc,
};

pub const ERROR_TYPE: &'static str = "error_type";

/// Type of a path as reported by the file system, `ErrorType` when no status is available.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PathType {
  Directory,
  File,
  Symlink,
  ErrorType,
}

impl PathType {
  pub fn as_str(&self) -> &'static str {
    match self {
      PathType::Directory => DIR_TYPE,
      PathType::File => FILE_TYPE,
      PathType::Symlink => SYMLINK_TYPE,
      PathType::ErrorType => ERROR_TYPE,
    }
  }
}

impl From<FileType> for PathType {
  fn from(file_type: FileType) -> Self {
    match file_type {
      FileType::Directory => PathType::Directory,
      FileType::File => PathType::File,
      FileType::Symlink => PathType::Symlink,
    }
  }
}

impl Display for PathType {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Answers existence and type queries against a file system and keeps a working directory.
///
/// Every query is a fresh round trip, nothing is cached. The working directory only moves
/// after the file system confirms the target is a directory.
pub struct HdfsClient {
  fs: FileSystemRef,
  base_dir: String,
}

impl HdfsClient {
  pub fn new(hdfs_url: &str, user: &str) -> Result<Self> {
    Self::with_config(hdfs_url, user, Arc::new(Configuration::new()))
  }

  pub fn with_config(hdfs_url: &str, user: &str, config: ConfigRef) -> Result<Self> {
    let fs = WebHdfsBuilder::new(hdfs_url, config).user(user).build()?;
    Ok(Self::with_file_system(fs, PATH_SEPARATOR.to_string()))
  }

  pub fn with_file_system<S: Into<String>>(fs: FileSystemRef, base_dir: S) -> Self {
    Self { fs, base_dir: base_dir.into() }
  }

  pub fn file_system(&self) -> &FileSystemRef {
    &self.fs
  }

  pub fn current_directory(&self) -> &str {
    &self.base_dir
  }

  pub fn exists(&self, path: &str) -> bool {
    self.path_type(path) != PathType::ErrorType
  }

  pub fn path_type(&self, path: &str) -> PathType {
    match self.fs.try_get_file_status(path) {
      Ok(Some(status)) => status.file_type().into(),
      Ok(None) => PathType::ErrorType,
      Err(e) => {
        warn!("Failed to query status of {}: {}", path, e);
        PathType::ErrorType
      }
    }
  }

  /// Names of the entries directly under the current directory.
  pub fn list_current_directory(&self) -> Result<Vec<String>> {
    self.fs.list(&self.base_dir)
  }

  pub fn descend(&mut self, name: &str) {
    let path = join_path(&self.base_dir, name);
    if self.path_type(&path) == PathType::Directory {
      info!("Current directory changed to {}", path);
      self.base_dir = path;
    } else {
      warn!("Cannot descend into {}: not a directory under {}", name, self.base_dir);
    }
  }

  pub fn select_file(&self, file_name: &str) -> Option<String> {
    let path = join_path(&self.base_dir, file_name);
    if self.path_type(&path) == PathType::File {
      Some(path)
    } else {
      warn!("{} is not a file under {}", file_name, self.base_dir);
      None
    }
  }

  pub fn set_current_directory(&mut self, path: &str) {
    if self.path_type(path) == PathType::Directory {
      info!("Current directory changed to {}", path);
      self.base_dir = path.to_string();
    } else {
      warn!("Cannot change directory to {}: not a directory", path);
    }
  }
}
