//! Test utilities for depforge-lib.
//!
//! Helpers to build source archives, scripts trees and fake tools on the fly
//! so pipeline tests never touch the network or a real compiler.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::fetch::{FetchError, Fetcher, HttpFetcher};

/// `file://` URL for a local path.
pub fn file_url(path: &Path) -> String {
  format!("file://{}", path.display())
}

/// Write a `.tar.gz` whose entries all live below `top_level/`.
pub fn write_tar_gz(dest: &Path, top_level: &str, files: &[(&str, &str)]) {
  if let Some(parent) = dest.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  let encoder = GzEncoder::new(fs::File::create(dest).unwrap(), Compression::default());
  let mut builder = tar::Builder::new(encoder);
  for (path, content) in files {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    builder
      .append_data(&mut header, format!("{}/{}", top_level, path), content.as_bytes())
      .unwrap();
  }
  builder.into_inner().unwrap().finish().unwrap();
}

/// Write a `.zip` whose entries all live below `top_level/`.
pub fn write_zip(dest: &Path, top_level: &str, files: &[(&str, &str)]) {
  let mut writer = zip::ZipWriter::new(fs::File::create(dest).unwrap());
  let options = zip::write::SimpleFileOptions::default();
  writer.add_directory(format!("{}/", top_level), options).unwrap();
  for (path, content) in files {
    writer.start_file(format!("{}/{}", top_level, path), options).unwrap();
    writer.write_all(content.as_bytes()).unwrap();
  }
  writer.finish().unwrap();
}

/// Write an executable shell script.
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
  use std::os::unix::fs::PermissionsExt;

  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, format!("#!/bin/sh\n{}", body)).unwrap();
  fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Fetcher that records every URL it is asked for and delegates to [`HttpFetcher`].
#[derive(Debug, Default)]
pub struct CountingFetcher {
  count: AtomicUsize,
  urls: Mutex<Vec<String>>,
}

impl CountingFetcher {
  pub fn count(&self) -> usize {
    self.count.load(Ordering::SeqCst)
  }

  pub fn urls(&self) -> Vec<String> {
    self.urls.lock().unwrap().clone()
  }
}

impl Fetcher for CountingFetcher {
  fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
    self.count.fetch_add(1, Ordering::SeqCst);
    self.urls.lock().unwrap().push(url.to_string());
    HttpFetcher.fetch(url, dest)
  }
}

/// A throwaway project root with `scripts/<platform>/` and a local mirror.
pub struct ScriptsTree {
  pub temp: tempfile::TempDir,
  pub platform: String,
}

impl ScriptsTree {
  pub fn new(platform: &str) -> Self {
    let temp = tempfile::TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("scripts").join(platform)).unwrap();
    Self {
      temp,
      platform: platform.to_string(),
    }
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn scripts_dir(&self) -> PathBuf {
    self.root().join("scripts").join(&self.platform)
  }

  /// Directory served as `download_base` through `file://`.
  pub fn mirror_dir(&self) -> PathBuf {
    self.root().join("mirror")
  }

  pub fn mirror_url(&self) -> String {
    file_url(&self.mirror_dir())
  }

  /// Write `<platform>.config`, prefixed with `download_base` pointing at the mirror.
  pub fn platform_config(&self, extra: &str) -> &Self {
    let content = format!("download_base = {:?}\n{}", self.mirror_url(), extra);
    fs::write(self.scripts_dir().join(format!("{}.config", self.platform)), content).unwrap();
    self
  }

  pub fn build_order(&self, libraries: &[&str]) -> &Self {
    let quoted: Vec<String> = libraries.iter().map(|l| format!("{:?}", l)).collect();
    fs::write(
      self.scripts_dir().join("build.config"),
      format!("build_order = [{}]\n", quoted.join(", ")),
    )
    .unwrap();
    self
  }

  pub fn library_config(&self, library: &str, content: &str) -> &Self {
    fs::write(
      self.scripts_dir().join(format!("{}-{}.config", self.platform, library)),
      content,
    )
    .unwrap();
    self
  }

  /// Publish `mirror/<library>/<archive_name>.tar.gz` with the given files.
  pub fn publish(&self, library: &str, archive_name: &str, files: &[(&str, &str)]) -> &Self {
    let dest = self.mirror_dir().join(library).join(format!("{}.tar.gz", archive_name));
    write_tar_gz(&dest, archive_name, files);
    self
  }

  pub fn build_dir(&self, library: &str) -> PathBuf {
    self.root().join("build").join(&self.platform).join(library)
  }

  pub fn staging_dir(&self, library: &str) -> PathBuf {
    self.root().join("build").join(&self.platform).join("X").join(library)
  }
}
