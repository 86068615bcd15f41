//! Configuration files and run settings.
//!
//! Platform and library configuration lives under `scripts/<platform>/` as TOML:
//! - `<platform>.config`: settings shared by every library of the platform
//! - `build.config`: the build order
//! - `<platform>-<library>.config`: per-library settings and stage overrides

pub mod library;
pub mod platform;
pub mod settings;

use std::path::{Path, PathBuf};

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use library::{LibraryPlan, LibrarySpec, default_download_url, library_config_path, load_library_plan};
pub use platform::{PlatformConfig, ToolSpec, build_order_path, load_build_order, load_platform_config, platform_config_path};
pub use settings::BuildSettings;

/// Errors raised while locating or parsing configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The configuration file does not exist.
  #[error("config not found: {}", path.display())]
  NotFound { path: PathBuf },

  /// The configuration file exists but could not be read.
  #[error("failed to read config '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The configuration file is not valid TOML or has unexpected fields.
  #[error("failed to parse config '{}': {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}

/// Read and deserialize a TOML configuration file.
pub(crate) fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
  if !path.is_file() {
    return Err(ConfigError::NotFound {
      path: path.to_path_buf(),
    });
  }

  let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  toml::from_str(&content).map_err(|source| ConfigError::Parse {
    path: path.to_path_buf(),
    source,
  })
}

/// A list of words written either as a TOML array or as a single string.
///
/// Strings are split like a shell would split them: on whitespace, with
/// single and double quotes grouping words and backslash escaping the next
/// character.
///
/// ```toml
/// cmake_options = "-DBUILD_SHARED_LIBS=OFF -DCMAKE_C_FLAGS='-O2 -g'"
/// cmake_options = ["-DBUILD_SHARED_LIBS=OFF", "-DCMAKE_C_FLAGS=-O2 -g"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WordList(pub Vec<String>);

impl WordList {
  pub fn iter(&self) -> std::slice::Iter<'_, String> {
    self.0.iter()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }
}

impl<'a> IntoIterator for &'a WordList {
  type Item = &'a String;
  type IntoIter = std::slice::Iter<'a, String>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}

impl From<Vec<String>> for WordList {
  fn from(words: Vec<String>) -> Self {
    Self(words)
  }
}

impl<'de> Deserialize<'de> for WordList {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Line(String),
      List(Vec<String>),
    }

    match Raw::deserialize(deserializer)? {
      Raw::List(words) => Ok(Self(words)),
      Raw::Line(line) => shlex::split(&line)
        .map(Self)
        .ok_or_else(|| de::Error::custom(format!("unterminated quote or escape in {line:?}"))),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Deserialize)]
  struct Holder {
    words: WordList,
  }

  fn words(line: &str) -> Result<Vec<String>, toml::de::Error> {
    toml::from_str::<Holder>(&format!("words = {line:?}")).map(|h| h.words.0)
  }

  #[test]
  fn string_splits_on_whitespace() {
    assert_eq!(words("  a  b\tc ").unwrap(), vec!["a", "b", "c"]);
    assert!(words("   ").unwrap().is_empty());
  }

  #[test]
  fn string_respects_quotes_and_escapes() {
    assert_eq!(
      words(r#"-DCMAKE_C_FLAGS='-O2 -g' "--with x" plain"#).unwrap(),
      vec!["-DCMAKE_C_FLAGS=-O2 -g", "--with x", "plain"]
    );
    assert_eq!(words(r#"a "" b"#).unwrap(), vec!["a", "", "b"]);
    assert_eq!(words(r"a\ b c").unwrap(), vec!["a b", "c"]);
  }

  #[test]
  fn string_with_unterminated_quote_is_rejected() {
    assert!(words("'open").is_err());
    assert!(words("trailing\\").is_err());
  }

  #[test]
  fn word_list_from_string_or_array() {
    let from_string: Holder = toml::from_str(r#"words = "zlib png""#).unwrap();
    let from_array: Holder = toml::from_str(r#"words = ["zlib", "png"]"#).unwrap();
    assert_eq!(from_string.words, from_array.words);
    assert_eq!(from_string.words.len(), 2);
  }

  #[test]
  fn word_list_reports_bad_quotes() {
    let result: Result<Holder, _> = toml::from_str(r#"words = "'unbalanced""#);
    assert!(result.is_err());
  }

  #[test]
  fn read_config_missing_file_is_not_found() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("absent.config");
    let err = read_config::<toml::Table>(&path).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { path: p } if p == path));
  }

  #[test]
  fn read_config_reports_parse_errors_with_path() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("broken.config");
    std::fs::write(&path, "this is = = not toml").unwrap();
    let err = read_config::<toml::Table>(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("broken.config"));
  }
}
