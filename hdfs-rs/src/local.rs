//! `FileSystem` over the machine's own disk, used for `file://` urls and local engine sessions.

use crate::{
  error::{
    HdfsLibErrorKind::{FileNotFoundError, IoError},
    Result,
  },
  fs::{
    file_status::{DirInfo, FileInfo, FileStat, FileStatus},
    file_system::{FileSystem, InputStreamRef},
  },
};
use failure::{Fail, ResultExt};
use std::{
  fs::{self, File, Metadata, OpenOptions},
  io::{ErrorKind, Write},
  os::unix::fs::{MetadataExt, PermissionsExt},
  path::{Path, PathBuf},
};

const FILE_URL_PREFIX: &'static str = "file://";

#[derive(Debug, Default)]
pub struct LocalFileSystem {}

impl LocalFileSystem {
  pub fn new() -> Self {
    Self {}
  }
}

fn local_path(path: &str) -> PathBuf {
  PathBuf::from(path.strip_prefix(FILE_URL_PREFIX).unwrap_or(path))
}

fn metadata(path: &Path) -> Result<Metadata> {
  match fs::metadata(path) {
    Ok(m) => Ok(m),
    Err(e) if e.kind() == ErrorKind::NotFound => {
      Err(FileNotFoundError(path.display().to_string()).into())
    }
    Err(e) => Err(e.context(IoError).into()),
  }
}

fn user_name(uid: u32) -> String {
  users::get_user_by_uid(uid)
    .map(|u| u.name().to_string_lossy().into_owned())
    .unwrap_or_else(|| uid.to_string())
}

fn group_name(gid: u32) -> String {
  users::get_group_by_gid(gid)
    .map(|g| g.name().to_string_lossy().into_owned())
    .unwrap_or_else(|| gid.to_string())
}

fn to_file_status(path: &Path, meta: &Metadata) -> FileStatus {
  let file_stat = FileStat::new(
    meta.mtime() * 1000,
    meta.atime() * 1000,
    user_name(meta.uid()),
    group_name(meta.gid()),
    format!("{:o}", meta.permissions().mode() & 0o777),
  );
  let path = path.display().to_string();

  if meta.is_dir() {
    FileStatus::Dir(DirInfo::new(path, file_stat))
  } else {
    FileStatus::File(FileInfo::new(path, meta.len(), 1, meta.blksize(), file_stat))
  }
}

impl FileSystem for LocalFileSystem {
  fn get_file_status(&self, path: &str) -> Result<FileStatus> {
    let path = local_path(path);
    let meta = metadata(&path)?;
    Ok(to_file_status(&path, &meta))
  }

  fn list_status(&self, path: &str) -> Result<Vec<FileStatus>> {
    let path = local_path(path);
    // Distinguish a missing directory from other io failures.
    metadata(&path)?;

    let mut statuses = Vec::new();
    for entry in fs::read_dir(&path).context(IoError)? {
      let entry = entry.context(IoError)?;
      let meta = entry.metadata().context(IoError)?;
      statuses.push(to_file_status(&entry.path(), &meta));
    }
    statuses.sort_by(|a, b| a.path().cmp(b.path()));
    Ok(statuses)
  }

  fn open(&self, path: &str) -> Result<InputStreamRef> {
    let path = local_path(path);
    metadata(&path)?;
    Ok(Box::new(File::open(&path).context(IoError)?))
  }

  fn create(&self, path: &str, data: &[u8], overwrite: bool) -> Result<()> {
    let path = local_path(path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).context(IoError)?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
      options.create(true).truncate(true);
    } else {
      options.create_new(true);
    }

    let mut file = options.open(&path).context(IoError)?;
    file.write_all(data).context(IoError)?;
    file.flush().context(IoError)?;
    Ok(())
  }

  fn mkdirs(&self, path: &str) -> Result<bool> {
    fs::create_dir_all(local_path(path)).context(IoError)?;
    Ok(true)
  }

  fn delete(&self, path: &str, recursive: bool) -> Result<bool> {
    let path = local_path(path);
    let meta = match metadata(&path) {
      Ok(m) => m,
      Err(e) if e.is_file_not_found() => return Ok(false),
      Err(e) => return Err(e),
    };

    if meta.is_dir() {
      if recursive {
        fs::remove_dir_all(&path).context(IoError)?;
      } else {
        fs::remove_dir(&path).context(IoError)?;
      }
    } else {
      fs::remove_file(&path).context(IoError)?;
    }
    Ok(true)
  }
}
