use crate::error::{HdfsLibError, Result};
use std::{collections::HashMap, str::FromStr, sync::Arc};

type ConfigKey = String;

pub const DFS_CLIENT_SOCKET_TIMEOUT_KEY: &'static str = "dfs.client.socket-timeout";
// Socket timeout in milliseconds
pub const DFS_CLIENT_SOCKET_TIMEOUT_DEFAULT: u64 = 60 * 1000;

pub const HADOOP_USER_NAME_KEY: &'static str = "hadoop.user.name";

#[derive(Debug, Clone)]
struct ConfigData {
  value: String,
}

#[derive(Debug, Clone, Default)]
pub struct Configuration {
  data: HashMap<ConfigKey, ConfigData>,
}

impl Configuration {
  pub fn new() -> Self {
    Self { data: HashMap::new() }
  }

  pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
    self.data.insert(key.into(), ConfigData { value: value.into() });
    self
  }

  pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
    self.set(key, value);
    self
  }

  pub fn contains(&self, key: &str) -> bool {
    self.data.contains_key(key)
  }

  pub fn get<T>(&self, key: &str) -> Result<Option<T>>
  where
    T: FromStr,
    T::Err: Into<HdfsLibError>,
  {
    // Values made only of whitespace, such as a tab separator, are taken as written.
    self
      .data
      .get(key)
      .map(|v| T::from_str(v.value.trim()).or_else(|_| T::from_str(&v.value)).map_err(|e| e.into()))
      .transpose()
  }

  pub fn get_or<T>(&self, key: &str, default: T) -> Result<T>
  where
    T: FromStr,
    T::Err: Into<HdfsLibError>,
  {
    self.get(key).map(|v| v.unwrap_or(default))
  }

  /// Parses `key=value` pairs, as passed on a command line.
  pub fn parse_pair(pair: &str) -> Result<(String, String)> {
    let mut parts = pair.splitn(2, '=');
    match (parts.next(), parts.next()) {
      (Some(k), Some(v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
      _ => Err(
        crate::error::HdfsLibErrorKind::ConfigError(format!("[{}] is not a key=value pair", pair))
          .into(),
      ),
    }
  }
}

pub type ConfigRef = Arc<Configuration>;

#[cfg(test)]
mod tests {
  use super::Configuration;
  use crate::error::HdfsLibErrorKind;

  #[test]
  fn test_typed_get() {
    let config = Configuration::new().with("a.int", " 42 ").with("a.bool", "true").with("a.str", "x");

    assert_eq!(Some(42u64), config.get::<u64>("a.int").unwrap());
    assert_eq!(Some(true), config.get::<bool>("a.bool").unwrap());
    assert_eq!(Some("x".to_string()), config.get::<String>("a.str").unwrap());
    assert_eq!(None, config.get::<u64>("missing").unwrap());
    assert_eq!(7u64, config.get_or("missing", 7u64).unwrap());
  }

  #[test]
  fn test_whitespace_value() {
    let config = Configuration::new().with("a.tab", "\t").with("a.space", " ").with("a.char", " ; ");

    assert_eq!(Some('\t'), config.get::<char>("a.tab").unwrap());
    assert_eq!(Some(' '), config.get::<char>("a.space").unwrap());
    assert_eq!(Some(';'), config.get::<char>("a.char").unwrap());
  }

  #[test]
  fn test_bad_value() {
    let config = Configuration::new().with("a.int", "forty");
    let err = config.get::<u32>("a.int").unwrap_err();
    match err.kind() {
      HdfsLibErrorKind::ConfigError(_) => {}
      other => panic!("Unexpected error kind: {:?}", other),
    }
  }

  #[test]
  fn test_parse_pair() {
    assert_eq!(
      ("k".to_string(), "v=1".to_string()),
      Configuration::parse_pair("k=v=1").unwrap()
    );
    assert!(Configuration::parse_pair("novalue").is_err());
    assert!(Configuration::parse_pair("=v").is_err());
  }
}
