use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::info;

use super::{Step, StepError};
use crate::config::LibrarySpec;
use crate::context::BuildContext;
use crate::process::run_shell;

/// A `[steps.<stage>]` table of a library config.
///
/// ```toml
/// [steps.prepare]
/// commands = ["./bootstrap.sh --prefix=\"$DEPFORGE_INSTALL_DIR\""]
/// cwd = "tools/build"
/// env = { CXXFLAGS = "-fPIC" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
  /// Shell snippets run in order; the first failure stops the stage.
  pub commands: Vec<String>,
  /// Working directory, relative to the library build directory.
  #[serde(default)]
  pub cwd: Option<PathBuf>,
  #[serde(default)]
  pub env: BTreeMap<String, String>,
  /// Shell override (`/bin/sh` on Unix, PowerShell on Windows).
  #[serde(default)]
  pub shell: Option<String>,
}

/// Runs a [`CommandSpec`] in place of a default stage.
pub struct CommandStep {
  spec: CommandSpec,
}

impl CommandStep {
  pub fn new(spec: CommandSpec) -> Self {
    Self { spec }
  }
}

impl Step for CommandStep {
  fn run(&self, ctx: &mut BuildContext, _spec: &LibrarySpec) -> Result<(), StepError> {
    let cwd = match &self.spec.cwd {
      Some(dir) => ctx.build_dir.join(dir),
      None => ctx.build_dir.clone(),
    };

    for command in &self.spec.commands {
      info!(library = %ctx.library, cmd = %command, "running");
      run_shell(ctx, command, &cwd, &self.spec.env, self.spec.shell.as_deref())?;
    }
    Ok(())
  }

  fn describe(&self) -> String {
    format!("commands ({})", self.spec.commands.len())
  }
}
