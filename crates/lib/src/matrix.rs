//! The build matrix: every configuration × every library of the build order.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::{BuildSettings, load_build_order, load_library_plan, load_platform_config};
use crate::context::PlatformContext;
use crate::error::BuildError;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::pipeline::run_library;
use crate::steps::{HookRegistry, StepSet};
use crate::tools::{ToolStatus, bootstrap_tools};
use crate::util::SearchPath;

/// What to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
  pub platform: String,
  /// Build only this library instead of the platform build order.
  pub library: Option<String>,
}

impl BuildRequest {
  pub fn new(platform: impl Into<String>) -> Self {
    Self {
      platform: platform.into(),
      library: None,
    }
  }

  pub fn with_library(mut self, library: impl Into<String>) -> Self {
    self.library = Some(library.into());
    self
  }
}

/// One finished (configuration, library) pair.
#[derive(Debug, Clone)]
pub struct LibraryBuild {
  pub configuration: String,
  pub library: String,
  pub elapsed: Duration,
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct MatrixReport {
  pub platform: String,
  pub arch: String,
  /// `<install_dir>/<platform>/<arch>`
  pub install_root: PathBuf,
  pub tools: Vec<(String, ToolStatus)>,
  /// In execution order.
  pub builds: Vec<LibraryBuild>,
  pub elapsed: Duration,
}

/// Drives the configuration × library loops.
pub struct MatrixDriver {
  settings: BuildSettings,
  fetcher: Arc<dyn Fetcher>,
  hooks: HookRegistry,
}

impl MatrixDriver {
  pub fn new(settings: BuildSettings) -> Self {
    Self {
      settings,
      fetcher: Arc::new(HttpFetcher),
      hooks: HookRegistry::new(),
    }
  }

  /// Use `fetcher` for source archives and tools.
  pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
    self.fetcher = fetcher;
    self
  }

  pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
    self.hooks = hooks;
    self
  }

  pub fn hooks_mut(&mut self) -> &mut HookRegistry {
    &mut self.hooks
  }

  /// Build every library of the request for every configuration.
  ///
  /// Configurations run in the declared order, and within each, libraries in
  /// build order. The first failure aborts the run. The process `PATH` and
  /// working directory are restored after every library and once more when
  /// the run ends.
  pub fn run(&self, request: &BuildRequest) -> Result<MatrixReport, BuildError> {
    let started = Instant::now();
    let _run_guard = ProcessStateGuard::capture().map_err(BuildError::io(&self.settings.root_dir))?;

    let scripts_dir = self.settings.scripts_dir(&request.platform);
    let config = load_platform_config(&scripts_dir, &request.platform)?;
    let order = match &request.library {
      Some(library) => vec![library.clone()],
      None => load_build_order(&scripts_dir)?,
    };
    if order.is_empty() {
      return Err(BuildError::NothingToBuild {
        platform: request.platform.clone(),
      });
    }

    let platform = Arc::new(PlatformContext::new(
      &self.settings,
      &request.platform,
      config,
      SearchPath::from_env(),
    ));
    info!(
      platform = %platform.platform,
      arch = %platform.arch,
      host = %crate::platform::host_description(),
      configurations = ?self.settings.configurations,
      libraries = ?order,
      "starting build"
    );
    if !self.hooks.is_empty() {
      debug!(hooks = ?self.hooks, "stage hooks registered");
    }

    let tools = bootstrap_tools(&platform, self.fetcher.as_ref())?;
    let defaults = StepSet::with_fetcher(Arc::clone(&self.fetcher));
    let mut builds = Vec::new();

    for configuration in &self.settings.configurations {
      let install_dir = platform.install_dir(configuration);
      fs::create_dir_all(&install_dir).map_err(BuildError::io(&install_dir))?;

      for library in &order {
        let _guard = ProcessStateGuard::capture().map_err(BuildError::io(&platform.root_dir))?;
        let library_started = Instant::now();

        let plan = load_library_plan(&platform.scripts_dir, &platform.platform, library, &defaults, &self.hooks)?;
        let mut ctx = platform.library_context(configuration, library, plan.config_path.clone());
        run_library(&mut ctx, plan)?;

        let elapsed = library_started.elapsed();
        info!(
          library = %library,
          configuration = %configuration,
          elapsed_ms = elapsed.as_millis() as u64,
          "library built"
        );
        builds.push(LibraryBuild {
          configuration: configuration.clone(),
          library: library.clone(),
          elapsed,
        });
      }
    }

    Ok(MatrixReport {
      platform: platform.platform.clone(),
      arch: platform.arch.clone(),
      install_root: platform.install_root.clone(),
      tools,
      builds,
      elapsed: started.elapsed(),
    })
  }
}

/// Saves the process `PATH` and working directory, restoring both on drop.
///
/// Steps registered through hooks run in-process and may change either;
/// holding a guard around each library keeps such changes from reaching
/// the next one, whether the library succeeded or failed.
#[derive(Debug)]
pub struct ProcessStateGuard {
  path: Option<OsString>,
  cwd: PathBuf,
}

impl ProcessStateGuard {
  pub fn capture() -> io::Result<Self> {
    Ok(Self {
      path: env::var_os("PATH"),
      cwd: env::current_dir()?,
    })
  }
}

impl Drop for ProcessStateGuard {
  fn drop(&mut self) {
    if env::var_os("PATH") != self.path {
      // SAFETY: builds run on a single thread and nothing else reads the
      // environment while the guard is dropped.
      unsafe {
        match &self.path {
          Some(path) => env::set_var("PATH", path),
          None => env::remove_var("PATH"),
        }
      }
      debug!("PATH restored");
    }

    if env::current_dir().ok().as_deref() != Some(self.cwd.as_path()) {
      match env::set_current_dir(&self.cwd) {
        Ok(()) => debug!(cwd = ?self.cwd, "working directory restored"),
        Err(e) => warn!(cwd = ?self.cwd, error = %e, "could not restore working directory"),
      }
    }
  }
}
