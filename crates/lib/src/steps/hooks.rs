use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{Step, StepError, StepName, StepSet};
use crate::config::LibrarySpec;
use crate::context::BuildContext;

/// Programmatic stage overrides keyed by library name.
///
/// Hooks are applied after the `[steps.*]` tables of the library config, so
/// a registered hook wins over a declarative override of the same stage.
#[derive(Clone, Default)]
pub struct HookRegistry {
  hooks: BTreeMap<(String, StepName), Arc<dyn Step>>,
}

impl HookRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Replace `stage` for `library` with `step`.
  pub fn register(&mut self, library: &str, stage: StepName, step: impl Step + 'static) -> &mut Self {
    self.hooks.insert((library.to_string(), stage), Arc::new(step));
    self
  }

  /// Replace `stage` for `library` with a closure.
  pub fn register_fn<F>(&mut self, library: &str, stage: StepName, f: F) -> &mut Self
  where
    F: Fn(&mut BuildContext, &LibrarySpec) -> Result<(), StepError> + Send + Sync + 'static,
  {
    self.register(library, stage, f)
  }

  pub fn is_empty(&self) -> bool {
    self.hooks.is_empty()
  }

  /// Install the hooks registered for `library` into `steps`.
  pub fn apply(&self, library: &str, steps: &mut StepSet) {
    for ((_, stage), step) in self.hooks.iter().filter(|((lib, _), _)| lib == library) {
      steps.set(*stage, Arc::clone(step));
    }
  }
}

impl fmt::Debug for HookRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list()
      .entries(self.hooks.keys().map(|(lib, stage)| format!("{lib}.{stage}")))
      .finish()
  }
}
