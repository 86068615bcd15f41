//! CMake invocations of the default prepare/build/install stages.

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use super::StepError;
use crate::config::LibrarySpec;
use crate::context::BuildContext;
use crate::platform::arch::Arch;
use crate::process::run_program;

fn binary_dir(ctx: &BuildContext, spec: &LibrarySpec) -> PathBuf {
  ctx.build_dir.join(&spec.cmake_build_subdir)
}

fn define(name: &str, value: impl std::fmt::Display) -> OsString {
  OsString::from(format!("-D{name}={value}"))
}

/// Value for `-A`: Visual Studio generators want their own arch names.
fn generator_platform(generator: Option<&str>, arch: &str) -> String {
  match (generator, Arch::from_label(arch)) {
    (Some(g), Some(parsed)) if g.starts_with("Visual Studio") => parsed.msvc_name().to_string(),
    _ => arch.to_string(),
  }
}

/// Arguments of the configure call, run from the binary directory.
pub fn cmake_configure_args(ctx: &BuildContext, spec: &LibrarySpec) -> Vec<OsString> {
  let platform = &ctx.platform;
  let install = ctx.install_dir.display();

  let mut args = vec![ctx.build_dir.join(&spec.cmake_directory).into_os_string()];
  if let Some(generator) = &platform.generator {
    args.push("-G".into());
    args.push(generator.into());
  }
  if let Some(arch) = &platform.generator_arch {
    args.push("-A".into());
    args.push(generator_platform(platform.generator.as_deref(), arch).into());
  }
  args.push(define("CMAKE_BUILD_TYPE", &ctx.configuration));
  args.push(define("CMAKE_PREFIX_PATH", &install));
  args.push(define("CMAKE_FIND_ROOT_PATH", &install));
  args.push(define("CMAKE_INSTALL_PREFIX", &install));
  args.push(define("CMAKE_INSTALL_RPATH", ctx.install_dir.join("lib").display()));
  args.extend(platform.config.cmake_options.iter().map(OsString::from));
  args.extend(spec.cmake_options.iter().map(OsString::from));
  args
}

pub fn cmake_build_args(ctx: &BuildContext, spec: &LibrarySpec) -> Vec<OsString> {
  vec![
    "--build".into(),
    binary_dir(ctx, spec).into_os_string(),
    "--config".into(),
    ctx.configuration.as_str().into(),
    "--parallel".into(),
    ctx.platform.threads.to_string().into(),
  ]
}

pub fn cmake_install_args(ctx: &BuildContext, spec: &LibrarySpec) -> Vec<OsString> {
  vec![
    "--build".into(),
    binary_dir(ctx, spec).into_os_string(),
    "--config".into(),
    ctx.configuration.as_str().into(),
    "--target".into(),
    "install".into(),
  ]
}

pub(super) fn prepare(ctx: &BuildContext, spec: &LibrarySpec) -> Result<(), StepError> {
  let bin = binary_dir(ctx, spec);
  fs::create_dir_all(&bin).map_err(StepError::io(&bin))?;
  run_program(ctx, &ctx.cmake_program(), &cmake_configure_args(ctx, spec), &bin)
}

pub(super) fn build(ctx: &BuildContext, spec: &LibrarySpec) -> Result<(), StepError> {
  run_program(ctx, &ctx.cmake_program(), &cmake_build_args(ctx, spec), &ctx.build_dir)
}

pub(super) fn install(ctx: &BuildContext, spec: &LibrarySpec) -> Result<(), StepError> {
  run_program(ctx, &ctx.cmake_program(), &cmake_install_args(ctx, spec), &ctx.build_dir)
}
