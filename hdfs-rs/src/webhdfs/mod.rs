//! Blocking client of the WebHDFS REST API, each call is a single round trip to the namenode
//! (plus the datanode hop for `OPEN` and `CREATE`).

pub(crate) mod protocol;

use crate::{
  check_args,
  config::{ConfigRef, DFS_CLIENT_SOCKET_TIMEOUT_DEFAULT, DFS_CLIENT_SOCKET_TIMEOUT_KEY, HADOOP_USER_NAME_KEY},
  error::{
    HdfsLibError,
    HdfsLibErrorKind::{
      FileNotFoundError, HttpError, InvalidArgumentError, IoError, JsonError, PathError, RemoteError,
    },
    Result,
  },
  fs::{
    file_status::FileStatus,
    file_system::{FileSystem, FileSystemRef, InputStreamRef},
    path::FsPath,
  },
};
use failure::ResultExt;
use protocol::{
  BooleanResponse, BuildArgs, FileStatusResponse, ListStatusResponse, RemoteExceptionResponse,
  FILE_NOT_FOUND_EXCEPTION, OP_CREATE, OP_DELETE, OP_GET_FILE_STATUS, OP_LIST_STATUS, OP_MKDIRS,
  OP_OPEN,
};
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, sync::Arc, time::Duration};
use ureq::{Agent, AgentBuilder, Response};
use url::Url;

const WEBHDFS_PREFIX: &'static str = "/webhdfs/v1";
// Hadoop's static web user, used when no identity is configured.
const DEFAULT_WEB_USER: &'static str = "dr.who";

const METHOD_GET: &'static str = "GET";
const METHOD_PUT: &'static str = "PUT";
const METHOD_DELETE: &'static str = "DELETE";

pub struct WebHdfsFileSystem {
  base_url: Url,
  user: String,
  agent: Agent,
}

impl WebHdfsFileSystem {
  pub fn user(&self) -> &str {
    &self.user
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  fn operation_url(&self, path: &str) -> Result<Url> {
    check_args!(path.starts_with('/'), "WebHDFS path must be absolute: [{}]", path);
    let mut url = self.base_url.clone();
    url.set_path(&format!("{}{}", WEBHDFS_PREFIX, path));
    Ok(url)
  }

  fn call(
    &self,
    method: &str,
    path: &str,
    op: &str,
    params: &[(&str, String)],
    body: Option<&[u8]>,
  ) -> Result<Response> {
    let url = self.operation_url(path)?;
    debug!("WebHDFS request: {} {} op={} params={:?}", method, url, op, params);

    let mut request = self.agent.request_url(method, &url).query("op", op).query("user.name", &self.user);
    for (key, value) in params {
      request = request.query(key, value);
    }

    let result = match body {
      Some(data) => request.send_bytes(data),
      None => request.call(),
    };
    check_response(path, result)
  }

  // Namenode answers OPEN/CREATE with a redirect to the datanode holding the data.
  fn follow_redirect(
    &self,
    method: &str,
    path: &str,
    response: Response,
    body: Option<&[u8]>,
  ) -> Result<Response> {
    let location = match response.header("Location") {
      Some(location) => location.to_string(),
      None => {
        return Err(HttpError(format!("Redirect for [{}] carries no Location header", path)).into())
      }
    };
    let url = self.base_url.join(&location).context(PathError)?;
    debug!("WebHDFS redirect: {} {}", method, url);

    let request = self.agent.request_url(method, &url);
    let result = match body {
      Some(data) => request.send_bytes(data),
      None => request.call(),
    };
    check_response(path, result)
  }

  fn call_json<T: DeserializeOwned>(
    &self,
    method: &str,
    path: &str,
    op: &str,
    params: &[(&str, String)],
  ) -> Result<T> {
    let response = self.call(method, path, op, params, None)?;
    decode_json(response)
  }
}

fn is_redirect(response: &Response) -> bool {
  (300..400).contains(&response.status())
}

fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
  let body = response.into_string().context(IoError)?;
  Ok(serde_json::from_str(&body).context(JsonError)?)
}

fn check_response(path: &str, result: std::result::Result<Response, ureq::Error>) -> Result<Response> {
  match result {
    Ok(response) => Ok(response),
    Err(ureq::Error::Status(code, response)) => Err(remote_error(path, code, response)),
    Err(ureq::Error::Transport(transport)) => Err(HttpError(transport.to_string()).into()),
  }
}

fn remote_error(path: &str, code: u16, response: Response) -> HdfsLibError {
  let body = response.into_string().unwrap_or_default();
  match serde_json::from_str::<RemoteExceptionResponse>(&body) {
    Ok(r) if r.remote_exception.exception == FILE_NOT_FOUND_EXCEPTION => {
      FileNotFoundError(path.to_string()).into()
    }
    Ok(r) => RemoteError(r.remote_exception).into(),
    Err(_) if code == 404 => FileNotFoundError(path.to_string()).into(),
    Err(_) => HttpError(format!("Status {} for [{}]: {}", code, path, body)).into(),
  }
}

impl FileSystem for WebHdfsFileSystem {
  fn get_file_status(&self, path: &str) -> Result<FileStatus> {
    let response: FileStatusResponse = self.call_json(METHOD_GET, path, OP_GET_FILE_STATUS, &[])?;
    FileStatus::try_from(BuildArgs::new(&response.file_status, path))
  }

  fn list_status(&self, path: &str) -> Result<Vec<FileStatus>> {
    let response: ListStatusResponse = self.call_json(METHOD_GET, path, OP_LIST_STATUS, &[])?;
    response
      .file_statuses
      .file_status
      .iter()
      .map(|s| FileStatus::try_from(BuildArgs::new(s, path)))
      .collect()
  }

  fn open(&self, path: &str) -> Result<InputStreamRef> {
    let mut response = self.call(METHOD_GET, path, OP_OPEN, &[], None)?;
    if is_redirect(&response) {
      response = self.follow_redirect(METHOD_GET, path, response, None)?;
    }
    Ok(response.into_reader())
  }

  fn create(&self, path: &str, data: &[u8], overwrite: bool) -> Result<()> {
    let params = [("overwrite", overwrite.to_string())];
    let response = self.call(METHOD_PUT, path, OP_CREATE, &params, None)?;
    if !is_redirect(&response) {
      return Err(
        HttpError(format!("Namenode did not redirect CREATE of [{}], status {}", path, response.status()))
          .into(),
      );
    }
    let response = self.follow_redirect(METHOD_PUT, path, response, Some(data))?;
    debug!("Created [{}] with status {}", path, response.status());
    Ok(())
  }

  fn mkdirs(&self, path: &str) -> Result<bool> {
    let response: BooleanResponse = self.call_json(METHOD_PUT, path, OP_MKDIRS, &[])?;
    Ok(response.boolean)
  }

  fn delete(&self, path: &str, recursive: bool) -> Result<bool> {
    let params = [("recursive", recursive.to_string())];
    let response: BooleanResponse = self.call_json(METHOD_DELETE, path, OP_DELETE, &params)?;
    Ok(response.boolean)
  }
}

pub struct WebHdfsBuilder<'a> {
  path: &'a str,
  config: ConfigRef,
  user: Option<String>,
}

impl<'a> WebHdfsBuilder<'a> {
  pub fn new(path: &'a str, config: ConfigRef) -> Self {
    Self { path, config, user: None }
  }

  pub fn supports_scheme(scheme: &str) -> bool {
    Self::http_scheme(scheme).is_some()
  }

  fn http_scheme(scheme: &str) -> Option<&'static str> {
    match scheme {
      "http" | "webhdfs" => Some("http"),
      "https" | "swebhdfs" => Some("https"),
      _ => None,
    }
  }

  pub fn user<S: Into<String>>(mut self, user: S) -> Self {
    self.user = Some(user.into());
    self
  }

  fn resolve_user(&self, path: &FsPath) -> Result<String> {
    if let Some(user) = &self.user {
      return Ok(user.clone());
    }
    if let Some(user) = self.config.get::<String>(HADOOP_USER_NAME_KEY)? {
      return Ok(user);
    }
    if let Some(user) = path.user_name() {
      return Ok(user.to_string());
    }
    Ok(
      users::get_current_username()
        .map(|u| u.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_WEB_USER.to_string()),
    )
  }

  pub fn build_file_system(self) -> Result<WebHdfsFileSystem> {
    let path = FsPath::try_from(self.path)?;
    let scheme = match Self::http_scheme(path.scheme()) {
      Some(s) => s,
      None => {
        return Err(
          InvalidArgumentError(format!("[{}]'s schema is not a WebHDFS schema", self.path)).into(),
        )
      }
    };
    check_args!(!path.host_port().is_empty(), "[{}] has no namenode address", self.path);

    let base_url = Url::parse(&format!("{}://{}", scheme, path.host_port())).context(PathError)?;
    let user = self.resolve_user(&path)?;
    let timeout =
      self.config.get_or(DFS_CLIENT_SOCKET_TIMEOUT_KEY, DFS_CLIENT_SOCKET_TIMEOUT_DEFAULT)?;

    let agent = AgentBuilder::new().timeout(Duration::from_millis(timeout)).redirects(0).build();

    info!("Connecting to WebHDFS at {} as {}", base_url, user);
    Ok(WebHdfsFileSystem { base_url, user, agent })
  }

  pub fn build(self) -> Result<FileSystemRef> {
    Ok(Arc::new(self.build_file_system()?))
  }
}
