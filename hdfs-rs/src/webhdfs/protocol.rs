//! JSON bodies of the WebHDFS REST API.

use crate::{
  error::{HdfsLibError, HdfsLibErrorKind::UnsupportedFileType, RemoteErrorInfo, Result},
  fs::{
    file_status::{DirInfo, FileInfo, FileStat, FileStatus, LinkInfo, DIR_TYPE, FILE_TYPE, SYMLINK_TYPE},
    path::join_path,
  },
};
use serde::Deserialize;
use std::convert::TryFrom;

pub(crate) const OP_GET_FILE_STATUS: &'static str = "GETFILESTATUS";
pub(crate) const OP_LIST_STATUS: &'static str = "LISTSTATUS";
pub(crate) const OP_OPEN: &'static str = "OPEN";
pub(crate) const OP_CREATE: &'static str = "CREATE";
pub(crate) const OP_MKDIRS: &'static str = "MKDIRS";
pub(crate) const OP_DELETE: &'static str = "DELETE";

pub(crate) const FILE_NOT_FOUND_EXCEPTION: &'static str = "FileNotFoundException";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WebHdfsFileStatus {
  #[serde(default)]
  access_time: i64,
  #[serde(default)]
  block_size: u64,
  #[serde(default)]
  group: String,
  #[serde(default)]
  length: u64,
  #[serde(default)]
  modification_time: i64,
  #[serde(default)]
  owner: String,
  #[serde(default)]
  path_suffix: String,
  #[serde(default)]
  permission: String,
  #[serde(default)]
  replication: u16,
  #[serde(default)]
  symlink: String,
  #[serde(rename = "type")]
  file_type: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileStatusResponse {
  #[serde(rename = "FileStatus")]
  pub(crate) file_status: WebHdfsFileStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileStatuses {
  #[serde(rename = "FileStatus", default)]
  pub(crate) file_status: Vec<WebHdfsFileStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListStatusResponse {
  #[serde(rename = "FileStatuses")]
  pub(crate) file_statuses: FileStatuses,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BooleanResponse {
  pub(crate) boolean: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteExceptionResponse {
  #[serde(rename = "RemoteException")]
  pub(crate) remote_exception: RemoteErrorInfo,
}

#[derive(Debug, new)]
pub(crate) struct BuildArgs<'a> {
  status: &'a WebHdfsFileStatus,
  parent_path: &'a str,
}

impl<'a> BuildArgs<'a> {
  // GETFILESTATUS reports an empty suffix, the queried path is the full path.
  fn build_full_path(&self) -> String {
    if self.status.path_suffix.is_empty() {
      self.parent_path.to_string()
    } else {
      join_path(self.parent_path, &self.status.path_suffix)
    }
  }

  fn file_stat(&self) -> FileStat {
    FileStat::new(
      self.status.modification_time,
      self.status.access_time,
      self.status.owner.clone(),
      self.status.group.clone(),
      self.status.permission.clone(),
    )
  }
}

impl<'a> TryFrom<BuildArgs<'a>> for FileStatus {
  type Error = HdfsLibError;

  fn try_from(args: BuildArgs<'a>) -> Result<Self> {
    debug!("file status: {:?}", args);
    match args.status.file_type.as_str() {
      FILE_TYPE => Ok(FileStatus::File(FileInfo::new(
        args.build_full_path(),
        args.status.length,
        args.status.replication,
        args.status.block_size,
        args.file_stat(),
      ))),
      DIR_TYPE => Ok(FileStatus::Dir(DirInfo::new(args.build_full_path(), args.file_stat()))),
      SYMLINK_TYPE => Ok(FileStatus::Symlink(LinkInfo::new(
        args.build_full_path(),
        args.status.symlink.clone(),
        args.file_stat(),
      ))),
      other => Err(UnsupportedFileType(format!("{} at {}", other, args.build_full_path())).into()),
    }
  }
}
