use crate::{
  config::ConfigRef,
  error::{
    HdfsLibErrorKind::{InvalidArgumentError, IoError},
    Result,
  },
  fs::{file_status::FileStatus, path::FsPath},
  local::LocalFileSystem,
  webhdfs::WebHdfsBuilder,
};
use failure::ResultExt;
use std::{convert::TryFrom, io::Read, sync::Arc};

pub type FileSystemRef = Arc<dyn FileSystem>;

pub type InputStreamRef = Box<dyn Read + Send>;

pub trait FileSystem: Send + Sync {
  /// Fails with `FileNotFoundError` when nothing exists at `path`.
  fn get_file_status(&self, path: &str) -> Result<FileStatus>;

  /// Entries directly under the directory `path`.
  fn list_status(&self, path: &str) -> Result<Vec<FileStatus>>;

  fn open(&self, path: &str) -> Result<InputStreamRef>;

  fn create(&self, path: &str, data: &[u8], overwrite: bool) -> Result<()>;

  fn mkdirs(&self, path: &str) -> Result<bool>;

  fn delete(&self, path: &str, recursive: bool) -> Result<bool>;

  fn try_get_file_status(&self, path: &str) -> Result<Option<FileStatus>> {
    match self.get_file_status(path) {
      Ok(status) => Ok(Some(status)),
      Err(e) if e.is_file_not_found() => Ok(None),
      Err(e) => Err(e),
    }
  }

  fn list(&self, path: &str) -> Result<Vec<String>> {
    Ok(self.list_status(path)?.iter().map(|s| s.name().to_string()).collect())
  }

  fn read_to_end(&self, path: &str) -> Result<Vec<u8>> {
    let mut content = Vec::new();
    self.open(path)?.read_to_end(&mut content).context(IoError)?;
    Ok(content)
  }
}

const FILE_SCHEMA: &'static str = "file";

// Methods for creating file systems
pub fn make_file_system(fs_path: &str, config: ConfigRef) -> Result<FileSystemRef> {
  let path = FsPath::try_from(fs_path)?;
  match path.scheme() {
    FILE_SCHEMA => Ok(Arc::new(LocalFileSystem::new())),
    s if WebHdfsBuilder::supports_scheme(s) => WebHdfsBuilder::new(fs_path, config).build(),
    s => Err(InvalidArgumentError(format!("Unsupported file system scheme [{}] in {}", s, fs_path)).into()),
  }
}
