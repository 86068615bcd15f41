//! Pipeline stages.
//!
//! Every library goes through the same nine stages in a fixed order. A
//! [`StepSet`] maps each stage to the [`Step`] implementation that runs it;
//! it starts from the engine defaults and is then adjusted per library by
//! `[steps.<stage>]` config tables and [`HookRegistry`] entries.

mod cmake;
mod command;
mod defaults;
mod download;
mod extract;
mod hooks;
mod make;

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::config::LibrarySpec;
use crate::context::BuildContext;
use crate::fetch::{FetchError, Fetcher, HttpFetcher};

pub use cmake::{cmake_build_args, cmake_configure_args, cmake_install_args};
pub use command::{CommandSpec, CommandStep};
pub use defaults::{BuildStep, InstallStep, NoOpStep, PrepareStep};
pub use download::DownloadStep;
pub use extract::ExtractStep;
pub use hooks::HookRegistry;
pub use make::{configure_args, make_build_args, make_install_args};

/// The stages of the per-library pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
  Download,
  Extract,
  PatchPrepare,
  Prepare,
  PatchBuild,
  Build,
  PatchInstall,
  Install,
  PostInstall,
}

impl StepName {
  pub const ALL: [StepName; 9] = [
    StepName::Download,
    StepName::Extract,
    StepName::PatchPrepare,
    StepName::Prepare,
    StepName::PatchBuild,
    StepName::Build,
    StepName::PatchInstall,
    StepName::Install,
    StepName::PostInstall,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      StepName::Download => "download",
      StepName::Extract => "extract",
      StepName::PatchPrepare => "patch_prepare",
      StepName::Prepare => "prepare",
      StepName::PatchBuild => "patch_build",
      StepName::Build => "build",
      StepName::PatchInstall => "patch_install",
      StepName::Install => "install",
      StepName::PostInstall => "post_install",
    }
  }

  fn index(self) -> usize {
    self as usize
  }
}

impl fmt::Display for StepName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Errors raised by a single stage.
#[derive(Debug, Error)]
pub enum StepError {
  #[error("command failed with exit code {code:?}: {cmd}")]
  CmdFailed { cmd: String, code: Option<i32> },

  #[error("failed to start '{program}': {source}")]
  SpawnFailed {
    program: String,
    #[source]
    source: io::Error,
  },

  #[error("'{program}' not found on the search path")]
  ToolNotFound {
    program: String,
    #[source]
    source: which::Error,
  },

  #[error("library '{library}' has no archive_name")]
  MissingArchiveName { library: String },

  #[error("library '{library}' has no download_url and the platform has no download_base")]
  MissingDownloadUrl { library: String },

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error("failed to extract '{}': {source}", archive.display())]
  Extract {
    archive: PathBuf,
    #[source]
    source: ArchiveError,
    /// Last lines of the removed archive.
    tail: String,
  },

  #[error("no configure script in '{}'; set use_cmake or override the prepare step", dir.display())]
  NoConfigureScript { dir: PathBuf },

  #[error("search path contains an entry that cannot be joined: {0}")]
  SearchPath(#[from] std::env::JoinPathsError),

  #[error("I/O error at '{}': {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("{0}")]
  Custom(String),
}

impl StepError {
  pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> StepError {
    let path = path.into();
    move |source| StepError::Io { path, source }
  }
}

/// One stage implementation.
pub trait Step: Send + Sync {
  fn run(&self, ctx: &mut BuildContext, spec: &LibrarySpec) -> Result<(), StepError>;

  /// Short label shown in logs.
  fn describe(&self) -> String {
    "custom".to_string()
  }
}

impl<F> Step for F
where
  F: Fn(&mut BuildContext, &LibrarySpec) -> Result<(), StepError> + Send + Sync,
{
  fn run(&self, ctx: &mut BuildContext, spec: &LibrarySpec) -> Result<(), StepError> {
    self(ctx, spec)
  }
}

/// A complete stage-to-implementation mapping.
///
/// Cloning is cheap and yields an independent set: replacing a stage in the
/// clone never touches the original.
#[derive(Clone)]
pub struct StepSet {
  steps: [Arc<dyn Step>; 9],
}

impl StepSet {
  /// Engine defaults using the HTTP/file transport.
  pub fn defaults() -> Self {
    Self::with_fetcher(Arc::new(HttpFetcher))
  }

  /// Engine defaults downloading through `fetcher`.
  pub fn with_fetcher(fetcher: Arc<dyn Fetcher>) -> Self {
    let noop: Arc<dyn Step> = Arc::new(NoOpStep);
    Self {
      steps: [
        Arc::new(DownloadStep::new(fetcher)),
        Arc::new(ExtractStep),
        noop.clone(),
        Arc::new(PrepareStep),
        noop.clone(),
        Arc::new(BuildStep),
        noop.clone(),
        Arc::new(InstallStep),
        noop,
      ],
    }
  }

  pub fn get(&self, name: StepName) -> &Arc<dyn Step> {
    &self.steps[name.index()]
  }

  pub fn set(&mut self, name: StepName, step: Arc<dyn Step>) {
    self.steps[name.index()] = step;
  }

  /// Whether `name` runs the very same implementation in both sets.
  pub fn same_as(&self, other: &StepSet, name: StepName) -> bool {
    Arc::ptr_eq(self.get(name), other.get(name))
  }

  pub fn iter(&self) -> impl Iterator<Item = (StepName, &Arc<dyn Step>)> {
    StepName::ALL.into_iter().map(|name| (name, self.get(name)))
  }
}

impl Default for StepSet {
  fn default() -> Self {
    Self::defaults()
  }
}

impl fmt::Debug for StepSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map()
      .entries(self.iter().map(|(name, step)| (name.as_str(), step.describe())))
      .finish()
  }
}
