use super::{Step, StepError, cmake, make};
use crate::config::LibrarySpec;
use crate::context::BuildContext;

/// Does nothing. Default of the patch and post-install stages.
pub struct NoOpStep;

impl Step for NoOpStep {
  fn run(&self, _ctx: &mut BuildContext, _spec: &LibrarySpec) -> Result<(), StepError> {
    Ok(())
  }

  fn describe(&self) -> String {
    "no-op".to_string()
  }
}

/// CMake configure, or `./configure` when the library does not use CMake.
pub struct PrepareStep;

impl Step for PrepareStep {
  fn run(&self, ctx: &mut BuildContext, spec: &LibrarySpec) -> Result<(), StepError> {
    if spec.use_cmake {
      cmake::prepare(ctx, spec)
    } else {
      make::prepare(ctx, spec)
    }
  }

  fn describe(&self) -> String {
    "default prepare".to_string()
  }
}

pub struct BuildStep;

impl Step for BuildStep {
  fn run(&self, ctx: &mut BuildContext, spec: &LibrarySpec) -> Result<(), StepError> {
    if spec.use_cmake {
      cmake::build(ctx, spec)
    } else {
      make::build(ctx, spec)
    }
  }

  fn describe(&self) -> String {
    "default build".to_string()
  }
}

pub struct InstallStep;

impl Step for InstallStep {
  fn run(&self, ctx: &mut BuildContext, spec: &LibrarySpec) -> Result<(), StepError> {
    if spec.use_cmake {
      cmake::install(ctx, spec)
    } else {
      make::install(ctx, spec)
    }
  }

  fn describe(&self) -> String {
    "default install".to_string()
  }
}
