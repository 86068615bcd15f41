//! The build command: runs the matrix and reports the result.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use depforge_lib::config::BuildSettings;
use depforge_lib::tools::ToolStatus;
use depforge_lib::{BuildRequest, MatrixDriver, MatrixReport};

use crate::output::{
  OutputFormat, format_duration, plural, print_build_row, print_json, print_stat, print_success, print_warning,
};

#[derive(Debug, Serialize)]
struct BuildSummary {
  platform: String,
  arch: String,
  install_root: PathBuf,
  elapsed_ms: u64,
  builds: Vec<BuildEntry>,
  tools: Vec<ToolEntry>,
}

#[derive(Debug, Serialize)]
struct BuildEntry {
  configuration: String,
  library: String,
  elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
struct ToolEntry {
  name: String,
  status: &'static str,
  path: Option<PathBuf>,
}

impl From<&MatrixReport> for BuildSummary {
  fn from(report: &MatrixReport) -> Self {
    Self {
      platform: report.platform.clone(),
      arch: report.arch.clone(),
      install_root: report.install_root.clone(),
      elapsed_ms: report.elapsed.as_millis() as u64,
      builds: report
        .builds
        .iter()
        .map(|b| BuildEntry {
          configuration: b.configuration.clone(),
          library: b.library.clone(),
          elapsed_ms: b.elapsed.as_millis() as u64,
        })
        .collect(),
      tools: report
        .tools
        .iter()
        .map(|(name, status)| {
          let (status, path) = match status {
            ToolStatus::Found(path) => ("found", Some(path.clone())),
            ToolStatus::Installed(path) => ("installed", Some(path.clone())),
            ToolStatus::Unresolved => ("unresolved", None),
          };
          ToolEntry {
            name: name.clone(),
            status,
            path,
          }
        })
        .collect(),
    }
  }
}

/// Build `request` with `settings` and print the report.
pub fn cmd_build(settings: BuildSettings, request: &BuildRequest, format: OutputFormat) -> Result<()> {
  let driver = MatrixDriver::new(settings);
  let report = driver
    .run(request)
    .with_context(|| format!("Build for platform '{}' failed", request.platform))?;

  if format.is_json() {
    return print_json(&BuildSummary::from(&report));
  }

  for (name, status) in &report.tools {
    if *status == ToolStatus::Unresolved {
      print_warning(&format!("Tool '{}' could not be resolved", name));
    }
  }

  let libraries: BTreeSet<&str> = report.builds.iter().map(|b| b.library.as_str()).collect();
  let configurations: BTreeSet<&str> = report.builds.iter().map(|b| b.configuration.as_str()).collect();

  println!();
  print_success(&format!(
    "Built {} × {} for {} ({}) in {}",
    plural(libraries.len(), "library", "libraries"),
    plural(configurations.len(), "configuration", "configurations"),
    report.platform,
    report.arch,
    format_duration(report.elapsed)
  ));
  for build in &report.builds {
    print_build_row(&build.configuration, &build.library, build.elapsed);
  }
  print_stat("Installed to", &report.install_root.display().to_string());

  Ok(())
}
