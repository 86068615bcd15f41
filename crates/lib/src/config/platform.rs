//! Platform-wide configuration (`scripts/<platform>/<platform>.config`) and
//! the build order (`scripts/<platform>/build.config`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::{ConfigError, WordList, read_config};
use crate::consts::{BUILD_ORDER_FILE, CONFIG_EXTENSION, DEFAULT_CMAKE_PROGRAM, DEFAULT_MAKE_PROGRAM};

/// Settings shared by every library built for one platform.
///
/// ```toml
/// generator = "Ninja"
/// download_base = "https://mirror.example.org/sources"
/// cmake_options = "-DCMAKE_POSITION_INDEPENDENT_CODE=ON"
///
/// [env]
/// CC = "clang"
///
/// [[tools]]
/// name = "cmake"
/// url = "https://github.com/Kitware/CMake/releases/download/v3.30.5/cmake-3.30.5-linux-x86_64.tar.gz"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformConfig {
  /// CMake generator (`-G`).
  pub generator: Option<String>,
  /// CMake generator platform (`-A`), also used as the install path arch.
  pub generator_arch: Option<String>,
  /// CMake executable name or path.
  pub cmake: Option<String>,
  /// make executable name or path.
  pub make: Option<String>,
  /// Base for default download URLs: `<base>/<library>/<archive>.tar.gz`.
  pub download_base: Option<String>,
  pub cmake_options: WordList,
  pub configure_options: WordList,
  pub make_options: WordList,
  /// Variables exported to every command of every library.
  pub env: BTreeMap<String, String>,
  /// Directories prepended to the search path, relative to the root directory.
  pub search_path: Vec<PathBuf>,
  /// Tools bootstrapped into the tools directory before building.
  pub tools: Vec<ToolSpec>,
}

impl PlatformConfig {
  pub fn cmake_program(&self) -> &str {
    self.cmake.as_deref().unwrap_or(DEFAULT_CMAKE_PROGRAM)
  }

  pub fn make_program(&self) -> &str {
    self.make.as_deref().unwrap_or(DEFAULT_MAKE_PROGRAM)
  }
}

/// A tool that must be resolvable before libraries are built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSpec {
  /// Executable name looked up on the search path.
  pub name: String,
  /// Archive to fetch into the tools directory when the tool is missing.
  pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildOrderFile {
  build_order: WordList,
}

pub fn platform_config_path(scripts_dir: &Path, platform: &str) -> PathBuf {
  scripts_dir.join(format!("{platform}.{CONFIG_EXTENSION}"))
}

pub fn build_order_path(scripts_dir: &Path) -> PathBuf {
  scripts_dir.join(BUILD_ORDER_FILE)
}

/// Load `<platform>.config` from the platform scripts directory.
pub fn load_platform_config(scripts_dir: &Path, platform: &str) -> Result<PlatformConfig, ConfigError> {
  let path = platform_config_path(scripts_dir, platform);
  let config: PlatformConfig = read_config(&path)?;
  debug!(path = ?path, tools = config.tools.len(), "loaded platform config");
  Ok(config)
}

/// Load the build order from `build.config`.
///
/// The returned list may be empty; deciding whether that is an error is up
/// to the caller.
pub fn load_build_order(scripts_dir: &Path) -> Result<Vec<String>, ConfigError> {
  let path = build_order_path(scripts_dir);
  let file: BuildOrderFile = read_config(&path)?;
  debug!(path = ?path, libraries = file.build_order.len(), "loaded build order");
  Ok(file.build_order.0)
}
