//! Bootstrapping of external tools into the local tools directory.
//!
//! A tool declared in the platform config is looked up on the search path
//! first. When it is missing its archive is downloaded to
//! `<tools>/downloads`, unpacked one level stripped into `<tools>` and looked
//! up again with `<tools>/bin` on the path.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::archive::{tail_lines, unpack_stripped};
use crate::config::ToolSpec;
use crate::consts::EXTRACT_FAILURE_TAIL_LINES;
use crate::context::PlatformContext;
use crate::error::BuildError;
use crate::fetch::{Fetcher, download_to};
use crate::steps::StepError;
use crate::util::SearchPath;

const DOWNLOADS_DIR: &str = "downloads";

/// Outcome of [`ensure_tool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
  /// Already resolvable before bootstrapping.
  Found(PathBuf),
  /// Resolvable after downloading and extracting it.
  Installed(PathBuf),
  /// Still missing after extraction; the run continues.
  Unresolved,
}

/// Make sure `tool` can be found, installing it into `tools_dir` if needed.
pub fn ensure_tool(
  tool: &ToolSpec,
  tools_dir: &Path,
  search_path: &SearchPath,
  fetcher: &dyn Fetcher,
) -> Result<ToolStatus, BuildError> {
  let unavailable = |source: StepError| BuildError::ToolUnavailable {
    tool: tool.name.clone(),
    source,
  };

  let mut search_path = search_path.clone();
  search_path.prepend(tools_dir.join("bin"));

  if let Some(path) = lookup(&tool.name, &search_path, tools_dir).map_err(unavailable)? {
    info!(tool = %tool.name, path = ?path, "tool found");
    return Ok(ToolStatus::Found(path));
  }

  let archive = tools_dir.join(DOWNLOADS_DIR).join(archive_file_name(&tool.url, &tool.name));
  if archive.is_file() {
    info!(tool = %tool.name, archive = ?archive, "tool archive already downloaded");
  } else {
    download_to(fetcher, &tool.url, &archive, None).map_err(|e| unavailable(e.into()))?;
  }

  if let Err(source) = unpack_stripped(&archive, tools_dir) {
    let tail = tail_lines(&archive, EXTRACT_FAILURE_TAIL_LINES);
    warn!(tool = %tool.name, archive = ?archive, "removing broken tool archive; last lines:\n{}", tail);
    if let Err(e) = fs::remove_file(&archive) {
      warn!(archive = ?archive, error = %e, "could not remove broken tool archive");
    }
    return Err(unavailable(StepError::Extract { archive, source, tail }));
  }

  match lookup(&tool.name, &search_path, tools_dir).map_err(unavailable)? {
    Some(path) => {
      info!(tool = %tool.name, path = ?path, "tool installed");
      Ok(ToolStatus::Installed(path))
    }
    None => {
      warn!(tool = %tool.name, tools_dir = ?tools_dir, "tool still not found after extraction");
      Ok(ToolStatus::Unresolved)
    }
  }
}

/// Run [`ensure_tool`] for every tool of the platform config.
pub fn bootstrap_tools(
  platform: &PlatformContext,
  fetcher: &dyn Fetcher,
) -> Result<Vec<(String, ToolStatus)>, BuildError> {
  platform
    .config
    .tools
    .iter()
    .map(|tool| {
      let status = ensure_tool(tool, &platform.tools_dir, &platform.search_path, fetcher)?;
      Ok((tool.name.clone(), status))
    })
    .collect()
}

fn lookup(name: &str, search_path: &SearchPath, cwd: &Path) -> Result<Option<PathBuf>, StepError> {
  let paths = search_path.join()?;
  Ok(which::which_in(name, Some(paths), cwd).ok())
}

/// Last URL path segment, or `<name>.tar.gz` when the URL has none.
fn archive_file_name(url: &str, name: &str) -> String {
  url
    .split(['?', '#'])
    .next()
    .and_then(|path| path.rsplit('/').next())
    .filter(|segment| !segment.is_empty())
    .map(str::to_string)
    .unwrap_or_else(|| format!("{name}.tar.gz"))
}
