//! Explicit build state threaded through the pipeline.
//!
//! [`PlatformContext`] is built once per run and shared read-only.
//! [`BuildContext`] is derived from it for every (configuration, library)
//! pair and owned by that library's pipeline run, so nothing one library
//! changes is visible to the next.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::config::{BuildSettings, LibrarySpec, PlatformConfig};
use crate::consts::{BUILD_DIR_NAME, ENV_PREFIX};
use crate::platform::arch::Arch;
use crate::platform::host_arch_label;
use crate::steps::StepError;
use crate::util::SearchPath;

/// Run-wide state for one platform.
#[derive(Debug, Clone)]
pub struct PlatformContext {
  pub platform: String,
  pub root_dir: PathBuf,
  pub scripts_dir: PathBuf,
  /// `<root>/build/<platform>`
  pub build_root: PathBuf,
  /// `<install_dir>/<platform>/<arch>`
  pub install_root: PathBuf,
  pub tools_dir: PathBuf,
  /// Install path arch label: the generator arch, or the host arch.
  pub arch: String,
  pub generator: Option<String>,
  pub generator_arch: Option<String>,
  pub threads: usize,
  pub staging_name: String,
  pub no_extract: bool,
  pub no_remove_build_dir: bool,
  pub config: PlatformConfig,
  /// Search path every library context starts from.
  pub search_path: SearchPath,
}

impl PlatformContext {
  /// Combine run settings and the platform config.
  ///
  /// Settings win over the platform config for generator and generator
  /// arch. `base_path` is extended with the platform `search_path` entries
  /// and `<tools>/bin`.
  pub fn new(settings: &BuildSettings, platform: &str, config: PlatformConfig, base_path: SearchPath) -> Self {
    let generator = settings.generator.clone().or_else(|| config.generator.clone());
    let generator_arch = settings
      .generator_arch
      .clone()
      .or_else(|| config.generator_arch.clone())
      .filter(|a| !a.is_empty());
    if let Some(label) = generator_arch.as_deref().filter(|a| Arch::from_label(a).is_none()) {
      warn!(generator_arch = %label, "unrecognized generator arch; passing it to cmake as is");
    }
    let arch = generator_arch.clone().unwrap_or_else(host_arch_label);

    let mut search_path = base_path;
    search_path.prepend_all(config.search_path.iter().map(|p| resolve(&settings.root_dir, p)));
    search_path.prepend(settings.tools_dir.join("bin"));

    Self {
      platform: platform.to_string(),
      root_dir: settings.root_dir.clone(),
      scripts_dir: settings.scripts_dir(platform),
      build_root: settings.root_dir.join(BUILD_DIR_NAME).join(platform),
      install_root: settings.install_dir.join(platform).join(&arch),
      tools_dir: settings.tools_dir.clone(),
      arch,
      generator,
      generator_arch,
      threads: settings.threads.max(1),
      staging_name: settings.staging_name.clone(),
      no_extract: settings.no_extract,
      no_remove_build_dir: settings.no_remove_build_dir,
      config,
      search_path,
    }
  }

  /// `<install_dir>/<platform>/<arch>/<configuration>`
  pub fn install_dir(&self, configuration: &str) -> PathBuf {
    self.install_root.join(configuration)
  }

  /// Extraction target and build tree of a library.
  pub fn library_build_dir(&self, library: &str) -> PathBuf {
    self.build_root.join(library)
  }

  /// Where a library's archive is downloaded.
  pub fn staging_dir(&self, library: &str) -> PathBuf {
    self.build_root.join(&self.staging_name).join(library)
  }

  /// Fresh context for one library in one configuration.
  pub fn library_context(self: &Arc<Self>, configuration: &str, library: &str, config_path: PathBuf) -> BuildContext {
    BuildContext {
      configuration: configuration.to_string(),
      install_dir: self.install_dir(configuration),
      library: library.to_string(),
      config_path,
      build_dir: self.library_build_dir(library),
      staging_dir: self.staging_dir(library),
      search_path: self.search_path.clone(),
      env: self.config.env.clone(),
      platform: Arc::clone(self),
    }
  }
}

/// State of one library's pipeline run.
#[derive(Debug, Clone)]
pub struct BuildContext {
  pub platform: Arc<PlatformContext>,
  pub configuration: String,
  pub install_dir: PathBuf,
  pub library: String,
  pub config_path: PathBuf,
  pub build_dir: PathBuf,
  pub staging_dir: PathBuf,
  pub search_path: SearchPath,
  /// Variables exported to every command of this run, on top of the
  /// `DEPFORGE_*` ones.
  pub env: BTreeMap<String, String>,
}

impl BuildContext {
  /// Merge the library's own environment and search path entries.
  pub fn apply_library_spec(&mut self, spec: &LibrarySpec) {
    self.env.extend(spec.env.iter().map(|(k, v)| (k.clone(), v.clone())));
    let root = self.platform.root_dir.clone();
    self.search_path.prepend_all(spec.search_path.iter().map(|p| resolve(&root, p)));
  }

  /// Variables handed to spawned commands, `PATH` excluded.
  pub fn exported_env(&self) -> Vec<(String, String)> {
    let p = &self.platform;
    let mut vars = vec![
      var("PLATFORM", p.platform.clone()),
      var("LIBRARY", self.library.clone()),
      var("CONFIGURATION", self.configuration.clone()),
      var("ARCH", p.arch.clone()),
      var("INSTALL_DIR", self.install_dir.display().to_string()),
      var("BUILD_DIR", self.build_dir.display().to_string()),
      var("STAGING_DIR", self.staging_dir.display().to_string()),
      var("THREADS", p.threads.to_string()),
    ];
    vars.extend(self.env.iter().map(|(k, v)| (k.clone(), v.clone())));
    vars
  }

  /// URL the download stage fetches.
  pub fn download_url(&self, spec: &LibrarySpec) -> Result<String, StepError> {
    if spec.archive_name().is_none() {
      return Err(StepError::MissingArchiveName {
        library: self.library.clone(),
      });
    }
    spec
      .resolved_download_url(&self.library, self.platform.config.download_base.as_deref())
      .ok_or_else(|| StepError::MissingDownloadUrl {
        library: self.library.clone(),
      })
  }

  /// Location of the library archive in the staging directory.
  ///
  /// Needs only the archive name; the URL, when one resolves, just picks
  /// the extension.
  pub fn archive_path(&self, spec: &LibrarySpec) -> Result<PathBuf, StepError> {
    let url = spec.resolved_download_url(&self.library, self.platform.config.download_base.as_deref());
    let file_name = spec
      .archive_file_name(url.as_deref())
      .ok_or_else(|| StepError::MissingArchiveName {
        library: self.library.clone(),
      })?;
    Ok(self.staging_dir.join(file_name))
  }

  /// A program path from the platform config, relative paths taken from the root.
  pub fn program(&self, program: &str) -> PathBuf {
    let path = Path::new(program);
    if path.components().count() > 1 {
      resolve(&self.platform.root_dir, path)
    } else {
      path.to_path_buf()
    }
  }

  pub fn cmake_program(&self) -> PathBuf {
    self.program(self.platform.config.cmake_program())
  }

  pub fn make_program(&self) -> PathBuf {
    self.program(self.platform.config.make_program())
  }
}

fn var(name: &str, value: String) -> (String, String) {
  (format!("{ENV_PREFIX}{name}"), value)
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    root.join(path)
  }
}
