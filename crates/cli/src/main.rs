mod cmd;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use clap::builder::FalseyValueParser;
use tracing_subscriber::EnvFilter;

use depforge_lib::BuildRequest;
use depforge_lib::config::BuildSettings;

use crate::output::{OutputFormat, print_error};

/// Build third-party dependencies for a target platform.
///
/// Reads `scripts/<PLATFORM>/` below the root directory and builds every
/// library of the platform build order (or only LIBRARY) for each
/// configuration.
#[derive(Debug, Parser)]
#[command(name = "depforge", author, version, about)]
struct Cli {
  /// Target platform (directory name under `scripts/`)
  platform: String,

  /// Build only this library instead of the platform build order
  library: Option<String>,

  /// Directory containing `scripts/` [default: current directory]
  #[arg(long, env = "DEPFORGE_ROOT")]
  root: Option<PathBuf>,

  /// Install tree root [default: <root>/dependencies]
  #[arg(long, env = "INSTALL_DIR")]
  install_dir: Option<PathBuf>,

  /// Space-separated target configurations [default: "RelWithDebInfo Release Debug"]
  #[arg(long, env = "BUILD_CONFIGURATION")]
  configurations: Option<String>,

  /// Directory for bootstrapped tools [default: <root>/tools]
  #[arg(long, env = "TOOLS_DIR")]
  tools_dir: Option<PathBuf>,

  /// CMake generator, overrides the platform config
  #[arg(long, env = "GENERATOR")]
  generator: Option<String>,

  /// CMake generator platform, overrides the platform config
  #[arg(long, env = "GENERATOR_ARCH")]
  generator_arch: Option<String>,

  /// Name of the staging directory under `build/<platform>/`
  #[arg(long, env = "X", default_value = depforge_lib::consts::DEFAULT_STAGING_NAME)]
  staging_name: String,

  /// Keep existing library build directories
  #[arg(long, env = "NO_REMOVE_BUILD_DIR", value_parser = FalseyValueParser::new())]
  no_remove_build_dir: bool,

  /// Skip the extract stage
  #[arg(long, env = "NO_EXTRACT", value_parser = FalseyValueParser::new())]
  no_extract: bool,

  /// Parallel jobs passed to the build tool [default: available CPUs]
  #[arg(long, env = "THREADS")]
  threads: Option<usize>,

  /// Output format of the final report
  #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
  format: OutputFormat,

  /// Enable debug logging
  #[arg(short, long)]
  verbose: bool,
}

impl Cli {
  fn settings(&self) -> Result<BuildSettings> {
    let cwd = std::env::current_dir().context("Failed to determine the current directory")?;
    let root = self.root.clone().unwrap_or_else(|| cwd.clone());
    let root = dunce::canonicalize(&root).with_context(|| format!("Root directory not found: {}", root.display()))?;

    let mut settings = BuildSettings::new(&root);
    if let Some(dir) = &self.install_dir {
      settings.install_dir = absolute(&cwd, dir);
    }
    if let Some(dir) = &self.tools_dir {
      settings.tools_dir = absolute(&cwd, dir);
    }
    if let Some(list) = &self.configurations {
      settings.set_configurations(list);
    }
    settings.generator = self.generator.clone().filter(|g| !g.is_empty());
    settings.generator_arch = self.generator_arch.clone().filter(|a| !a.is_empty());
    settings.staging_name = self.staging_name.clone();
    settings.no_remove_build_dir = self.no_remove_build_dir;
    settings.no_extract = self.no_extract;
    if let Some(threads) = self.threads {
      settings.threads = threads.max(1);
    }
    Ok(settings)
  }

  fn request(&self) -> BuildRequest {
    let request = BuildRequest::new(&self.platform);
    match &self.library {
      Some(library) => request.with_library(library),
      None => request,
    }
  }
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    cwd.join(path)
  }
}

fn init_logging(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(e) if e.use_stderr() => {
      let _ = e.print();
      return ExitCode::FAILURE;
    }
    Err(e) => e.exit(),
  };

  init_logging(cli.verbose);

  let result = cli
    .settings()
    .and_then(|settings| cmd::cmd_build(settings, &cli.request(), cli.format));

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
