//! `configure` and `make` invocations of the default prepare/build/install stages.

use std::ffi::OsString;

use super::StepError;
use crate::config::LibrarySpec;
use crate::context::BuildContext;
use crate::process::run_program;

/// Arguments of `./configure`.
pub fn configure_args(ctx: &BuildContext, spec: &LibrarySpec) -> Vec<OsString> {
  let mut args = vec![OsString::from(format!("--prefix={}", ctx.install_dir.display()))];
  args.extend(ctx.platform.config.configure_options.iter().map(OsString::from));
  args.extend(spec.configure_options.iter().map(OsString::from));
  args
}

fn make_options(ctx: &BuildContext, spec: &LibrarySpec) -> Vec<OsString> {
  let platform = &ctx.platform.config.make_options;
  platform.iter().chain(spec.make_options.iter()).map(OsString::from).collect()
}

pub fn make_build_args(ctx: &BuildContext, spec: &LibrarySpec) -> Vec<OsString> {
  let mut args = vec![OsString::from(format!("-j{}", ctx.platform.threads))];
  args.extend(make_options(ctx, spec));
  args
}

pub fn make_install_args(ctx: &BuildContext, spec: &LibrarySpec) -> Vec<OsString> {
  let mut args = vec![OsString::from("install")];
  args.extend(make_options(ctx, spec));
  args
}

pub(super) fn prepare(ctx: &BuildContext, spec: &LibrarySpec) -> Result<(), StepError> {
  let script = ctx.build_dir.join("configure");
  if !script.is_file() {
    return Err(StepError::NoConfigureScript {
      dir: ctx.build_dir.clone(),
    });
  }
  run_program(ctx, &script, &configure_args(ctx, spec), &ctx.build_dir)
}

pub(super) fn build(ctx: &BuildContext, spec: &LibrarySpec) -> Result<(), StepError> {
  run_program(ctx, &ctx.make_program(), &make_build_args(ctx, spec), &ctx.build_dir)
}

pub(super) fn install(ctx: &BuildContext, spec: &LibrarySpec) -> Result<(), StepError> {
  run_program(ctx, &ctx.make_program(), &make_install_args(ctx, spec), &ctx.build_dir)
}
