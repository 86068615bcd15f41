//! Per-library configuration (`scripts/<platform>/<platform>-<library>.config`).
//!
//! A library config is TOML holding the [`LibrarySpec`] fields plus an
//! optional `[steps.<stage>]` table per overridden stage:
//!
//! ```toml
//! use_cmake = true
//! archive_name = "zlib-1.3.1"
//! cmake_options = "-DZLIB_BUILD_EXAMPLES=OFF"
//!
//! [steps.post_install]
//! commands = ["rm -f \"$DEPFORGE_INSTALL_DIR/lib/libz.so\""]
//! ```
//!
//! Loading always starts from engine defaults, so nothing set for one
//! library is visible to the next.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::{ConfigError, WordList, read_config};
use crate::archive::ArchiveKind;
use crate::consts::{CONFIG_EXTENSION, DEFAULT_CMAKE_BUILD_SUBDIR};
use crate::steps::{CommandSpec, CommandStep, HookRegistry, StepName, StepSet};

/// Declarative build settings for one library.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibrarySpec {
  /// Build with CMake; otherwise with `configure` and `make`.
  pub use_cmake: bool,
  /// Explicit source URL. Defaults to `<download_base>/<library>/<archive_name>.tar.gz`.
  pub download_url: Option<String>,
  /// Archive base name in the staging directory.
  pub archive_name: Option<String>,
  /// Expected SHA-256 (lowercase hex) of a freshly downloaded archive.
  pub sha256: Option<String>,
  pub configure_options: WordList,
  pub cmake_options: WordList,
  /// Directory holding `CMakeLists.txt`, relative to the library build dir.
  pub cmake_directory: PathBuf,
  /// CMake binary directory, relative to the library build dir.
  pub cmake_build_subdir: PathBuf,
  pub make_options: WordList,
  /// Variables exported to this library's commands only.
  pub env: BTreeMap<String, String>,
  /// Directories prepended to this library's search path, relative to the root directory.
  pub search_path: Vec<PathBuf>,
}

impl Default for LibrarySpec {
  fn default() -> Self {
    Self {
      use_cmake: false,
      download_url: None,
      archive_name: None,
      sha256: None,
      configure_options: WordList::default(),
      cmake_options: WordList::default(),
      cmake_directory: PathBuf::from("."),
      cmake_build_subdir: PathBuf::from(DEFAULT_CMAKE_BUILD_SUBDIR),
      make_options: WordList::default(),
      env: BTreeMap::new(),
      search_path: Vec::new(),
    }
  }
}

impl LibrarySpec {
  /// The non-empty archive name, if set.
  pub fn archive_name(&self) -> Option<&str> {
    self.archive_name.as_deref().filter(|name| !name.trim().is_empty())
  }

  /// The URL the download stage fetches.
  ///
  /// An explicit `download_url` wins; otherwise the conventional
  /// `<base>/<library>/<archive_name>.tar.gz` is used when both a base and an
  /// archive name are known.
  pub fn resolved_download_url(&self, library: &str, download_base: Option<&str>) -> Option<String> {
    if let Some(url) = self.download_url.as_deref().filter(|u| !u.is_empty()) {
      return Some(url.to_string());
    }
    Some(default_download_url(download_base?, library, self.archive_name()?))
  }

  /// File name of the archive in the staging directory.
  ///
  /// Keeps the archive name as is when it already carries an archive
  /// extension, otherwise appends the extension of the download URL
  /// (`.tar.gz` without a URL or when it has none we recognise).
  pub fn archive_file_name(&self, url: Option<&str>) -> Option<String> {
    let name = self.archive_name()?;
    if ArchiveKind::from_name(name).is_some() {
      return Some(name.to_string());
    }
    let kind = url
      .and_then(|u| ArchiveKind::from_name(url_path(u)))
      .unwrap_or(ArchiveKind::TarGz);
    Some(format!("{}{}", name, kind.extension()))
  }
}

/// `<base>/<library>/<archive_name>.tar.gz`
pub fn default_download_url(base: &str, library: &str, archive_name: &str) -> String {
  format!("{}/{}/{}.tar.gz", base.trim_end_matches('/'), library, archive_name)
}

/// URL without query string or fragment.
fn url_path(url: &str) -> &str {
  url.split(['?', '#']).next().unwrap_or(url)
}

/// Everything the pipeline needs to build one library.
#[derive(Debug, Clone)]
pub struct LibraryPlan {
  pub name: String,
  pub config_path: PathBuf,
  pub spec: LibrarySpec,
  pub steps: StepSet,
}

pub fn library_config_path(scripts_dir: &Path, platform: &str, library: &str) -> PathBuf {
  scripts_dir.join(format!("{platform}-{library}.{CONFIG_EXTENSION}"))
}

/// Load a library's plan.
///
/// Starts from a copy of `defaults`, applies the `[steps.*]` overrides from the
/// config file, then any hooks registered for the library in `hooks`.
pub fn load_library_plan(
  scripts_dir: &Path,
  platform: &str,
  library: &str,
  defaults: &StepSet,
  hooks: &HookRegistry,
) -> Result<LibraryPlan, ConfigError> {
  let config_path = library_config_path(scripts_dir, platform, library);
  let (spec, overrides) = split_library_config(&config_path)?;

  let mut steps = defaults.clone();
  for (name, command) in overrides {
    debug!(library = %library, step = %name, commands = command.commands.len(), "stage overridden by config");
    steps.set(name, Arc::new(CommandStep::new(command)));
  }
  hooks.apply(library, &mut steps);

  Ok(LibraryPlan {
    name: library.to_string(),
    config_path,
    spec,
    steps,
  })
}

/// Parse a library config into its spec and its `[steps.*]` overrides.
fn split_library_config(path: &Path) -> Result<(LibrarySpec, BTreeMap<StepName, CommandSpec>), ConfigError> {
  let parse_error = |source| ConfigError::Parse {
    path: path.to_path_buf(),
    source,
  };

  let mut table: toml::Table = read_config(path)?;
  let overrides = match table.remove("steps") {
    Some(steps) => steps.try_into().map_err(parse_error)?,
    None => BTreeMap::new(),
  };
  let spec = toml::Value::Table(table).try_into().map_err(parse_error)?;

  Ok((spec, overrides))
}
