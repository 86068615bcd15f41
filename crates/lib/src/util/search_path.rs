//! An explicit executable search path.
//!
//! The engine never edits the process `PATH`. Each context carries its own
//! [`SearchPath`] which is handed to children as their `PATH` and used for
//! program lookup.

use std::env::{self, JoinPathsError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath(Vec<PathBuf>);

impl SearchPath {
  /// Snapshot of the current process `PATH`.
  pub fn from_env() -> Self {
    env::var_os("PATH").map(|p| Self::parse(&p)).unwrap_or_default()
  }

  pub fn parse(value: &std::ffi::OsStr) -> Self {
    Self(env::split_paths(value).filter(|p| !p.as_os_str().is_empty()).collect())
  }

  /// Put `dir` in front, unless it is already the first entry.
  pub fn prepend(&mut self, dir: impl Into<PathBuf>) {
    let dir = dir.into();
    if self.0.first() == Some(&dir) {
      return;
    }
    self.0.retain(|p| p != &dir);
    self.0.insert(0, dir);
  }

  /// Prepend several directories keeping their relative order.
  pub fn prepend_all<I, P>(&mut self, dirs: I)
  where
    I: IntoIterator<Item = P>,
    I::IntoIter: DoubleEndedIterator,
    P: Into<PathBuf>,
  {
    for dir in dirs.into_iter().rev() {
      self.prepend(dir);
    }
  }

  pub fn contains(&self, dir: &Path) -> bool {
    self.0.iter().any(|p| p == dir)
  }

  pub fn dirs(&self) -> &[PathBuf] {
    &self.0
  }

  /// Platform-joined form suitable for a `PATH` variable.
  pub fn join(&self) -> Result<OsString, JoinPathsError> {
    env::join_paths(&self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  fn prepend_moves_existing_entry_to_front() {
    let mut path = SearchPath(vec![PathBuf::from("/usr/bin"), PathBuf::from("/opt/tools/bin")]);
    path.prepend("/opt/tools/bin");
    assert_eq!(path.dirs(), &[PathBuf::from("/opt/tools/bin"), PathBuf::from("/usr/bin")]);
  }

  #[test]
  fn prepend_all_keeps_order() {
    let mut path = SearchPath(vec![PathBuf::from("/usr/bin")]);
    path.prepend_all(["/a", "/b"]);
    assert_eq!(
      path.dirs(),
      &[PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/usr/bin")]
    );
  }

  #[cfg(unix)]
  #[test]
  #[serial]
  fn from_env_reads_path() {
    temp_env::with_var("PATH", Some("/opt/a/bin:/opt/b/bin"), || {
      let path = SearchPath::from_env();
      assert_eq!(path.dirs(), &[PathBuf::from("/opt/a/bin"), PathBuf::from("/opt/b/bin")]);
    });
    temp_env::with_var_unset("PATH", || {
      assert!(SearchPath::from_env().dirs().is_empty());
    });
  }

  #[cfg(unix)]
  #[test]
  fn parse_and_join() {
    let path = SearchPath::parse(std::ffi::OsStr::new("/usr/local/bin::/usr/bin"));
    assert_eq!(path.dirs().len(), 2);
    assert!(path.contains(Path::new("/usr/bin")));
    assert_eq!(path.join().unwrap(), OsString::from("/usr/local/bin:/usr/bin"));
  }
}
