//! Spawning external programs.
//!
//! Children inherit stdio so build tool output streams straight to the
//! terminal. Their `PATH` is the context search path and they receive the
//! exported `DEPFORGE_*` variables; the rest of the environment is inherited.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::context::BuildContext;
use crate::steps::StepError;

/// Run `program` with `args` in `cwd`.
///
/// A bare program name is looked up on the context search path; anything
/// with a path separator is used as is.
pub fn run_program(ctx: &BuildContext, program: &Path, args: &[OsString], cwd: &Path) -> Result<(), StepError> {
  let resolved = resolve_program(ctx, program, cwd)?;
  let line = command_line(program, args);
  debug!(cmd = %line, cwd = ?cwd, "running program");

  let mut command = Command::new(&resolved);
  command.args(args).current_dir(cwd);
  apply_env(&mut command, ctx, None)?;
  wait(command, line, program)
}

/// Run a shell snippet in `cwd` with `extra_env` on top of the context variables.
pub fn run_shell(
  ctx: &BuildContext,
  script: &str,
  cwd: &Path,
  extra_env: &BTreeMap<String, String>,
  shell: Option<&str>,
) -> Result<(), StepError> {
  let (shell_cmd, shell_args) = get_shell(shell);
  debug!(cmd = %script, shell = %shell_cmd, cwd = ?cwd, "running shell command");

  let shell_path = resolve_program(ctx, Path::new(&shell_cmd), cwd)?;
  let mut command = Command::new(shell_path);
  command.args(&shell_args).arg(script).current_dir(cwd);
  apply_env(&mut command, ctx, Some(extra_env))?;
  wait(command, script.to_string(), Path::new(&shell_cmd))
}

fn resolve_program(ctx: &BuildContext, program: &Path, cwd: &Path) -> Result<PathBuf, StepError> {
  if program.components().count() > 1 {
    return Ok(if program.is_absolute() {
      program.to_path_buf()
    } else {
      cwd.join(program)
    });
  }

  let paths = ctx.search_path.join()?;
  which::which_in(program, Some(paths), cwd).map_err(|source| StepError::ToolNotFound {
    program: program.display().to_string(),
    source,
  })
}

fn apply_env(
  command: &mut Command,
  ctx: &BuildContext,
  extra_env: Option<&BTreeMap<String, String>>,
) -> Result<(), StepError> {
  command.env("PATH", ctx.search_path.join()?);
  command.envs(ctx.exported_env());
  if let Some(extra) = extra_env {
    command.envs(extra);
  }
  Ok(())
}

fn wait(mut command: Command, display: String, program: &Path) -> Result<(), StepError> {
  let status = command.status().map_err(|source| StepError::SpawnFailed {
    program: program.display().to_string(),
    source,
  })?;

  if !status.success() {
    return Err(StepError::CmdFailed {
      cmd: display,
      code: status.code(),
    });
  }
  Ok(())
}

fn command_line(program: &Path, args: &[OsString]) -> String {
  let mut line = program.display().to_string();
  for arg in args {
    line.push(' ');
    line.push_str(&arg.to_string_lossy());
  }
  line
}

/// Shell executable and the arguments preceding the script.
///
/// An explicit shell gets the flag matching its family. Without one,
/// `/bin/sh -c` is used on Unix and PowerShell on Windows; the user's
/// `$SHELL` is ignored since it may source profiles that rewrite `PATH`.
pub fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let args = if shell.contains("powershell") || shell.contains("pwsh") {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if shell.contains("cmd") {
      vec!["/C".to_string()]
    } else {
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    (
      "powershell.exe".to_string(),
      vec![
        "-NoProfile".to_string(),
        "-ExecutionPolicy".to_string(),
        "Bypass".to_string(),
        "-Command".to_string(),
      ],
    )
  }
}
