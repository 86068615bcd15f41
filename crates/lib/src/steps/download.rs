use std::sync::Arc;

use tracing::info;

use super::{Step, StepError};
use crate::config::LibrarySpec;
use crate::context::BuildContext;
use crate::fetch::{Fetcher, download_to};

/// Fetches the library archive into the staging directory.
///
/// An archive already present in the staging directory is reused without
/// touching the network.
pub struct DownloadStep {
  fetcher: Arc<dyn Fetcher>,
}

impl DownloadStep {
  pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
    Self { fetcher }
  }
}

impl Step for DownloadStep {
  fn run(&self, ctx: &mut BuildContext, spec: &LibrarySpec) -> Result<(), StepError> {
    let archive = ctx.archive_path(spec)?;
    if archive.is_file() {
      info!(library = %ctx.library, archive = ?archive, "archive already downloaded");
      return Ok(());
    }

    let url = ctx.download_url(spec)?;

    download_to(self.fetcher.as_ref(), &url, &archive, spec.sha256.as_deref())?;
    Ok(())
  }

  fn describe(&self) -> String {
    "download".to_string()
  }
}
