use crate::fs::path::file_name;
use std::fmt::{Display, Formatter};

pub const DIR_TYPE: &'static str = "DIRECTORY";
pub const FILE_TYPE: &'static str = "FILE";
pub const SYMLINK_TYPE: &'static str = "SYMLINK";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FileType {
  File,
  Directory,
  Symlink,
}

impl FileType {
  pub fn as_str(&self) -> &'static str {
    match self {
      FileType::File => FILE_TYPE,
      FileType::Directory => DIR_TYPE,
      FileType::Symlink => SYMLINK_TYPE,
    }
  }
}

impl Display for FileType {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone)]
pub enum FileStatus {
  File(FileInfo),
  Dir(DirInfo),
  Symlink(LinkInfo),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, new, Getters, CopyGetters)]
pub struct FileStat {
  #[get_copy = "pub"]
  modification_time: i64,
  #[get_copy = "pub"]
  access_time: i64,
  #[get = "pub"]
  owner: String,
  #[get = "pub"]
  group: String,
  #[get = "pub"]
  permission: String,
}

#[derive(Debug, Clone, new, Getters, CopyGetters)]
pub struct FileInfo {
  #[get = "pub"]
  path: String,
  #[get_copy = "pub"]
  length: u64,
  #[get_copy = "pub"]
  block_replication: u16,
  #[get_copy = "pub"]
  block_size: u64,
  #[get = "pub"]
  file_stat: FileStat,
}

#[derive(Debug, Clone, new, Getters)]
pub struct DirInfo {
  #[get = "pub"]
  path: String,
  #[get = "pub"]
  file_stat: FileStat,
}

/// A link as reported by the file system. The target is not resolved.
#[derive(Debug, Clone, new, Getters)]
pub struct LinkInfo {
  #[get = "pub"]
  path: String,
  #[get = "pub"]
  target: String,
  #[get = "pub"]
  file_stat: FileStat,
}

impl FileStatus {
  pub fn file_type(&self) -> FileType {
    match self {
      FileStatus::File(_) => FileType::File,
      FileStatus::Dir(_) => FileType::Directory,
      FileStatus::Symlink(_) => FileType::Symlink,
    }
  }

  pub fn is_dir(&self) -> bool {
    self.file_type() == FileType::Directory
  }

  pub fn is_file(&self) -> bool {
    self.file_type() == FileType::File
  }

  pub fn is_symlink(&self) -> bool {
    self.file_type() == FileType::Symlink
  }

  /// Full path of the entry.
  pub fn path(&self) -> &str {
    match self {
      FileStatus::File(info) => info.path(),
      FileStatus::Dir(info) => info.path(),
      FileStatus::Symlink(info) => info.path(),
    }
  }

  /// Last path component, the name a directory listing reports.
  pub fn name(&self) -> &str {
    file_name(self.path())
  }

  pub fn len(&self) -> u64 {
    match self {
      FileStatus::File(info) => info.length(),
      FileStatus::Dir(_) | FileStatus::Symlink(_) => 0,
    }
  }

  pub fn file_stat(&self) -> &FileStat {
    match self {
      FileStatus::File(info) => info.file_stat(),
      FileStatus::Dir(info) => info.file_stat(),
      FileStatus::Symlink(info) => info.file_stat(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::{DirInfo, FileInfo, FileStat, FileStatus, FileType, LinkInfo};

  #[test]
  fn test_accessors() {
    let stat = FileStat::new(1, 2, "hdfs".to_string(), "supergroup".to_string(), "644".to_string());
    let file = FileStatus::File(FileInfo::new("/data/a.csv".to_string(), 12, 3, 128, stat.clone()));
    let dir = FileStatus::Dir(DirInfo::new("/data/sub/".to_string(), stat.clone()));
    let link = FileStatus::Symlink(LinkInfo::new("/data/latest".to_string(), "/data/v2".to_string(), stat));

    assert_eq!(FileType::File, file.file_type());
    assert_eq!("a.csv", file.name());
    assert_eq!(12, file.len());
    assert!(file.is_file());

    assert_eq!(FileType::Directory, dir.file_type());
    assert_eq!("sub", dir.name());
    assert_eq!(0, dir.len());
    assert_eq!("hdfs", dir.file_stat().owner());
    assert_eq!("DIRECTORY", dir.file_type().to_string());

    assert!(link.is_symlink());
    assert!(!link.is_file() && !link.is_dir());
    assert_eq!("latest", link.name());
    assert_eq!(0, link.len());
    assert_eq!("SYMLINK", link.file_type().to_string());
  }
}
