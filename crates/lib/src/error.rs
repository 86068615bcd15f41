//! Top-level error of a build run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::steps::{StepError, StepName};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("nothing to build for platform '{platform}': the build order is empty")]
  NothingToBuild { platform: String },

  #[error("download of {library} ({configuration}) failed")]
  DownloadFailed {
    library: String,
    configuration: String,
    #[source]
    source: StepError,
  },

  #[error("extraction of {library} ({configuration}) failed")]
  ExtractFailed {
    library: String,
    configuration: String,
    #[source]
    source: StepError,
  },

  #[error("prepare of {library} ({configuration}) failed")]
  PrepareFailed {
    library: String,
    configuration: String,
    #[source]
    source: StepError,
  },

  #[error("build of {library} ({configuration}) failed")]
  BuildFailed {
    library: String,
    configuration: String,
    #[source]
    source: StepError,
  },

  #[error("install of {library} ({configuration}) failed")]
  InstallFailed {
    library: String,
    configuration: String,
    #[source]
    source: StepError,
  },

  #[error("tool '{tool}' is unavailable")]
  ToolUnavailable {
    tool: String,
    #[source]
    source: StepError,
  },

  #[error("I/O error at '{}': {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl BuildError {
  /// Map a failure of `step` to the error kind of its stage group.
  pub fn stage(step: StepName, library: &str, configuration: &str, source: StepError) -> Self {
    let library = library.to_string();
    let configuration = configuration.to_string();
    match step {
      StepName::Download => BuildError::DownloadFailed {
        library,
        configuration,
        source,
      },
      StepName::Extract => BuildError::ExtractFailed {
        library,
        configuration,
        source,
      },
      StepName::PatchPrepare | StepName::Prepare => BuildError::PrepareFailed {
        library,
        configuration,
        source,
      },
      StepName::PatchBuild | StepName::Build => BuildError::BuildFailed {
        library,
        configuration,
        source,
      },
      StepName::PatchInstall | StepName::Install | StepName::PostInstall => BuildError::InstallFailed {
        library,
        configuration,
        source,
      },
    }
  }

  pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> BuildError {
    let path = path.into();
    move |source| BuildError::Io { path, source }
  }
}
