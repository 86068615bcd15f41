use std::fs;

use tracing::{info, warn};

use super::{Step, StepError};
use crate::archive::{tail_lines, unpack_stripped};
use crate::config::LibrarySpec;
use crate::consts::EXTRACT_FAILURE_TAIL_LINES;
use crate::context::BuildContext;

/// Unpacks the staged archive into the library build directory, one level stripped.
///
/// A broken archive is deleted so the next run downloads it again.
pub struct ExtractStep;

impl Step for ExtractStep {
  fn run(&self, ctx: &mut BuildContext, spec: &LibrarySpec) -> Result<(), StepError> {
    let archive = ctx.archive_path(spec)?;

    match unpack_stripped(&archive, &ctx.build_dir) {
      Ok(entries) => {
        info!(library = %ctx.library, entries, dest = ?ctx.build_dir, "sources extracted");
        Ok(())
      }
      Err(source) => {
        let tail = tail_lines(&archive, EXTRACT_FAILURE_TAIL_LINES);
        warn!(archive = ?archive, "extraction failed, removing archive; last lines:\n{}", tail);
        if let Err(e) = fs::remove_file(&archive) {
          warn!(archive = ?archive, error = %e, "could not remove broken archive");
        }
        Err(StepError::Extract { archive, source, tail })
      }
    }
  }

  fn describe(&self) -> String {
    "extract".to_string()
  }
}
