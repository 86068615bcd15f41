//! Runs the nine stages for one library in one target configuration.

use std::fs;
use std::time::Instant;

use tracing::{error, info};

use crate::config::LibraryPlan;
use crate::context::BuildContext;
use crate::error::BuildError;
use crate::steps::StepName;

/// Build `plan` in `ctx`.
///
/// The staging directory is created and the library build directory is
/// recreated (kept when `no_remove_build_dir` is set) before the first
/// stage. Stages run in order and the first failure is returned as the
/// error kind of its stage.
pub fn run_library(ctx: &mut BuildContext, plan: LibraryPlan) -> Result<(), BuildError> {
  let LibraryPlan { spec, steps, .. } = plan;

  fs::create_dir_all(&ctx.staging_dir).map_err(BuildError::io(&ctx.staging_dir))?;
  prepare_build_dir(ctx)?;
  ctx.apply_library_spec(&spec);

  for (name, step) in steps.iter() {
    if name == StepName::Extract && ctx.platform.no_extract {
      info!(library = %ctx.library, "extract skipped");
      continue;
    }

    info!(
      platform = %ctx.platform.platform,
      library = %ctx.library,
      configuration = %ctx.configuration,
      step = %step.describe(),
      "==> {}",
      name
    );
    let started = Instant::now();

    if let Err(e) = step.run(ctx, &spec) {
      error!(
        library = %ctx.library,
        configuration = %ctx.configuration,
        error = %e,
        "{} failed",
        name
      );
      return Err(BuildError::stage(name, &ctx.library, &ctx.configuration, e));
    }

    info!(library = %ctx.library, elapsed_ms = started.elapsed().as_millis() as u64, "{} done", name);
  }

  Ok(())
}

fn prepare_build_dir(ctx: &BuildContext) -> Result<(), BuildError> {
  let dir = &ctx.build_dir;
  if ctx.platform.no_remove_build_dir {
    info!(dir = ?dir, "keeping existing build directory");
  } else if dir.exists() {
    fs::remove_dir_all(dir).map_err(BuildError::io(dir))?;
  }
  fs::create_dir_all(dir).map_err(BuildError::io(dir))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{BuildSettings, LibrarySpec, PlatformConfig};
  use crate::context::PlatformContext;
  use crate::steps::{StepError, StepSet};
  use crate::util::SearchPath;
  use crate::util::testutil::{CountingFetcher, ScriptsTree};
  use std::path::PathBuf;
  use std::sync::{Arc, Mutex};
  use tracing_test::traced_test;

  struct Fixture {
    tree: ScriptsTree,
    fetcher: Arc<CountingFetcher>,
    ran: Arc<Mutex<Vec<StepName>>>,
  }

  impl Fixture {
    fn new() -> Self {
      let tree = ScriptsTree::new("linux");
      tree.publish("zlib", "zlib-1.3.1", &[("CMakeLists.txt", "project(zlib)")]);
      Self {
        tree,
        fetcher: Arc::new(CountingFetcher::default()),
        ran: Arc::new(Mutex::new(Vec::new())),
      }
    }

    fn context(&self, adjust: impl FnOnce(&mut BuildSettings)) -> BuildContext {
      let mut settings = BuildSettings::new(self.tree.root());
      adjust(&mut settings);
      let config = PlatformConfig {
        download_base: Some(self.tree.mirror_url()),
        ..Default::default()
      };
      let platform = Arc::new(PlatformContext::new(&settings, "linux", config, SearchPath::from_env()));
      platform.library_context("Release", "zlib", PathBuf::new())
    }

    /// Defaults for download/extract, recorders everywhere else.
    fn plan(&self, failing: Option<StepName>) -> LibraryPlan {
      let mut steps = StepSet::with_fetcher(self.fetcher.clone());
      for name in StepName::ALL.into_iter().skip(2) {
        let ran = Arc::clone(&self.ran);
        steps.set(
          name,
          Arc::new(move |_: &mut BuildContext, _: &LibrarySpec| {
            ran.lock().unwrap().push(name);
            if Some(name) == failing {
              return Err(StepError::Custom(format!("{name} exploded")));
            }
            Ok(())
          }),
        );
      }
      LibraryPlan {
        name: "zlib".to_string(),
        config_path: PathBuf::new(),
        spec: LibrarySpec {
          archive_name: Some("zlib-1.3.1".to_string()),
          ..Default::default()
        },
        steps,
      }
    }

    fn ran(&self) -> Vec<StepName> {
      self.ran.lock().unwrap().clone()
    }
  }

  #[test]
  #[traced_test]
  fn runs_all_stages_in_order() {
    let fx = Fixture::new();
    let mut ctx = fx.context(|_| {});

    run_library(&mut ctx, fx.plan(None)).unwrap();

    assert_eq!(fx.ran(), StepName::ALL[2..].to_vec());
    assert_eq!(fx.fetcher.count(), 1);
    assert!(fx.tree.build_dir("zlib").join("CMakeLists.txt").is_file());
    assert!(logs_contain("==> patch_prepare"));
    assert!(logs_contain("==> post_install"));
  }

  #[test]
  fn first_failure_stops_and_maps_to_stage_group() {
    let fx = Fixture::new();
    let mut ctx = fx.context(|_| {});

    let err = run_library(&mut ctx, fx.plan(Some(StepName::PatchBuild))).unwrap_err();

    assert!(matches!(err, BuildError::BuildFailed { ref library, .. } if library == "zlib"));
    assert_eq!(
      fx.ran(),
      vec![StepName::PatchPrepare, StepName::Prepare, StepName::PatchBuild]
    );
  }

  #[test]
  fn build_dir_is_recreated_by_default() {
    let fx = Fixture::new();
    let stale = fx.tree.build_dir("zlib").join("stale.o");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "").unwrap();
    let mut ctx = fx.context(|_| {});

    run_library(&mut ctx, fx.plan(None)).unwrap();

    assert!(!stale.exists());
    assert!(fx.tree.staging_dir("zlib").join("zlib-1.3.1.tar.gz").is_file());
  }

  #[test]
  fn no_extract_and_no_remove_preserve_build_dir() {
    let fx = Fixture::new();
    let edited = fx.tree.build_dir("zlib").join("zconf.h");
    fs::create_dir_all(edited.parent().unwrap()).unwrap();
    fs::write(&edited, "/* local edit */").unwrap();
    let mut ctx = fx.context(|s| {
      s.no_extract = true;
      s.no_remove_build_dir = true;
    });

    run_library(&mut ctx, fx.plan(None)).unwrap();

    assert_eq!(fs::read_to_string(&edited).unwrap(), "/* local edit */");
    assert!(!fx.tree.build_dir("zlib").join("CMakeLists.txt").exists());
  }

  #[test]
  fn download_failure_is_download_failed() {
    let fx = Fixture::new();
    let mut ctx = fx.context(|_| {});
    let mut plan = fx.plan(None);
    plan.spec.archive_name = Some("zlib-9.9.9".to_string());

    let err = run_library(&mut ctx, plan).unwrap_err();

    assert!(matches!(err, BuildError::DownloadFailed { .. }));
    assert!(fx.ran().is_empty());
  }
}
