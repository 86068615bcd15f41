use std::path::{Path, PathBuf};

use crate::consts::{DEFAULT_CONFIGURATIONS, DEFAULT_INSTALL_DIR_NAME, DEFAULT_STAGING_NAME, DEFAULT_TOOLS_DIR_NAME};

/// Run-wide settings resolved from the command line and environment.
///
/// [`BuildSettings::new`] fills in the defaults relative to the root
/// directory; callers override individual fields afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
  /// Directory containing `scripts/` and receiving `build/`.
  pub root_dir: PathBuf,
  /// Root of the install tree (`<install_dir>/<platform>/<arch>/<configuration>`).
  pub install_dir: PathBuf,
  /// Target configurations, built in this order.
  pub configurations: Vec<String>,
  /// Local directory for bootstrapped tools.
  pub tools_dir: PathBuf,
  /// Build-system generator override (wins over the platform config).
  pub generator: Option<String>,
  /// Generator architecture override (wins over the platform config).
  pub generator_arch: Option<String>,
  /// Name of the per-platform staging directory holding archives.
  pub staging_name: String,
  /// Keep existing library build directories instead of recreating them.
  pub no_remove_build_dir: bool,
  /// Skip the extract stage.
  pub no_extract: bool,
  /// Parallel jobs passed to the build tool.
  pub threads: usize,
}

impl BuildSettings {
  pub fn new(root_dir: impl Into<PathBuf>) -> Self {
    let root_dir = root_dir.into();
    Self {
      install_dir: root_dir.join(DEFAULT_INSTALL_DIR_NAME),
      tools_dir: root_dir.join(DEFAULT_TOOLS_DIR_NAME),
      configurations: DEFAULT_CONFIGURATIONS.iter().map(|c| c.to_string()).collect(),
      generator: None,
      generator_arch: None,
      staging_name: DEFAULT_STAGING_NAME.to_string(),
      no_remove_build_dir: false,
      no_extract: false,
      threads: default_threads(),
      root_dir,
    }
  }

  /// Replace the configuration list from a space-separated string.
  ///
  /// A blank string keeps the current list.
  pub fn set_configurations(&mut self, list: &str) {
    let parsed = parse_configurations(list);
    if !parsed.is_empty() {
      self.configurations = parsed;
    }
  }

  pub fn scripts_dir(&self, platform: &str) -> PathBuf {
    scripts_dir(&self.root_dir, platform)
  }
}

/// `scripts/<platform>` below the given root.
pub fn scripts_dir(root: &Path, platform: &str) -> PathBuf {
  root.join(crate::consts::SCRIPTS_DIR_NAME).join(platform)
}

/// Split a space-separated configuration list.
pub fn parse_configurations(list: &str) -> Vec<String> {
  list.split_whitespace().map(str::to_string).collect()
}

/// Number of CPUs, used as the default build parallelism.
fn default_threads() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
