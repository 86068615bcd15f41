//! Shared test helpers for CLI integration tests.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

/// Variables the binary reads; cleared so the host environment cannot leak in.
const SETTINGS_VARS: &[&str] = &[
  "INSTALL_DIR",
  "BUILD_CONFIGURATION",
  "TOOLS_DIR",
  "GENERATOR",
  "GENERATOR_ARCH",
  "X",
  "NO_REMOVE_BUILD_DIR",
  "NO_EXTRACT",
  "THREADS",
  "RUST_LOG",
];

/// Isolated project root with a `scripts/linux` tree and a local source mirror.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// A root with a `linux` platform config whose `download_base` is the mirror.
  pub fn linux() -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file(
      "scripts/linux/linux.config",
      &format!("download_base = {:?}\n", format!("file://{}", env.mirror_path().display())),
    );
    env
  }

  /// Root path, canonicalized like the binary does.
  pub fn root_path(&self) -> PathBuf {
    let p = self.temp.path().to_path_buf();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn mirror_path(&self) -> PathBuf {
    self.root_path().join("mirror")
  }

  /// Write a file relative to the root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.root_path().join(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }

  pub fn build_order(&self, libraries: &[&str]) {
    let quoted: Vec<String> = libraries.iter().map(|l| format!("{:?}", l)).collect();
    self.write_file(
      "scripts/linux/build.config",
      &format!("build_order = [{}]\n", quoted.join(", ")),
    );
  }

  pub fn library_config(&self, library: &str, content: &str) {
    self.write_file(&format!("scripts/linux/linux-{}.config", library), content);
  }

  /// Publish `mirror/<library>/<archive>.tar.gz` with files below `<archive>/`.
  pub fn publish(&self, library: &str, archive: &str, files: &[(&str, &str)]) {
    let dest = self.mirror_path().join(library).join(format!("{}.tar.gz", archive));
    fs::create_dir_all(dest.parent().unwrap()).unwrap();
    let encoder = GzEncoder::new(fs::File::create(&dest).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, content) in files {
      let mut header = tar::Header::new_gnu();
      header.set_size(content.len() as u64);
      header.set_mode(0o644);
      header.set_cksum();
      builder
        .append_data(&mut header, format!("{}/{}", archive, path), content.as_bytes())
        .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
  }

  /// A library built entirely by `[steps.*]` commands that installs `<library>.h`.
  pub fn header_library(&self, library: &str) {
    let archive = format!("{}-1.0", library);
    self.publish(library, &archive, &[(&format!("{}.h", library), "#pragma once\n")]);
    self.library_config(
      library,
      &format!(
        r#"archive_name = {archive:?}

[steps.prepare]
commands = ["true"]

[steps.build]
commands = ["true"]

[steps.install]
commands = ["mkdir -p \"$DEPFORGE_INSTALL_DIR/include\"", "cp {library}.h \"$DEPFORGE_INSTALL_DIR/include/\""]
"#
      ),
    );
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.root_path().join(relative_path)
  }

  /// Command for the depforge binary rooted at this environment.
  pub fn depforge_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("depforge");
    for var in SETTINGS_VARS {
      cmd.env_remove(var);
    }
    cmd.env("DEPFORGE_ROOT", self.root_path());
    cmd.env("GENERATOR_ARCH", "x64");
    cmd.env("THREADS", "2");
    cmd
  }
}
