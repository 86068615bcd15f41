//! Build command integration tests.
//!
//! Libraries are built with shell `[steps.*]` overrides so no compiler or
//! CMake is needed.

#![cfg(unix)]

use std::fs;

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn builds_every_configuration() {
  let env = TestEnv::linux();
  env.header_library("hello");
  env.build_order(&["hello"]);

  env
    .depforge_cmd()
    .arg("linux")
    .assert()
    .success()
    .stdout(predicate::str::contains("Built 1 library × 3 configurations"));

  for configuration in ["RelWithDebInfo", "Release", "Debug"] {
    let header = env.path(&format!("dependencies/linux/x64/{}/include/hello.h", configuration));
    assert!(header.is_file(), "missing {}", header.display());
  }
  assert!(env.path("build/linux/X/hello/hello-1.0.tar.gz").is_file());
}

#[test]
fn configuration_list_from_environment() {
  let env = TestEnv::linux();
  env.header_library("hello");
  env.build_order(&["hello"]);

  env
    .depforge_cmd()
    .arg("linux")
    .env("BUILD_CONFIGURATION", "Debug")
    .env("INSTALL_DIR", env.path("out"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Built 1 library × 1 configuration"));

  assert!(env.path("out/linux/x64/Debug/include/hello.h").is_file());
  assert!(!env.path("out/linux/x64/Release").exists());
}

#[test]
fn single_library_argument_skips_build_order() {
  let env = TestEnv::linux();
  env.header_library("hello");
  env.header_library("world");
  env.build_order(&["hello", "world"]);

  env
    .depforge_cmd()
    .args(["linux", "world", "--configurations", "Release"])
    .assert()
    .success();

  assert!(env.path("dependencies/linux/x64/Release/include/world.h").is_file());
  assert!(!env.path("build/linux/hello").exists());
}

#[test]
fn missing_library_config_fails_before_building() {
  let env = TestEnv::linux();

  env
    .depforge_cmd()
    .args(["linux", "missinglib"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("linux-missinglib.config"));

  assert!(!env.path("build/linux/missinglib").exists());
}

#[test]
fn failing_library_stops_the_run() {
  let env = TestEnv::linux();
  env.header_library("a");
  env.header_library("c");
  env.publish("b", "b-1.0", &[("b.h", "")]);
  env.library_config(
    "b",
    r#"archive_name = "b-1.0"

[steps.prepare]
commands = ["true"]

[steps.build]
commands = ["exit 3"]
"#,
  );
  env.build_order(&["a", "b", "c"]);

  env
    .depforge_cmd()
    .arg("linux")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("build of b (RelWithDebInfo) failed"));

  assert!(env.path("dependencies/linux/x64/RelWithDebInfo/include/a.h").is_file());
  assert!(!env.path("build/linux/c").exists());
}

#[test]
fn empty_build_order_is_an_error() {
  let env = TestEnv::linux();
  env.build_order(&[]);

  env
    .depforge_cmd()
    .arg("linux")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("nothing to build"));
}

#[test]
fn missing_configure_script_explains_the_fix() {
  let env = TestEnv::linux();
  env.publish("plain", "plain-1.0", &[("Makefile", "all:\n")]);
  env.library_config("plain", r#"archive_name = "plain-1.0""#);

  env
    .depforge_cmd()
    .args(["linux", "plain", "--configurations", "Release"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("override the prepare step"));
}

#[test]
fn no_extract_keeps_local_edits() {
  let env = TestEnv::linux();
  env.header_library("hello");
  env.build_order(&["hello"]);
  env.write_file("build/linux/hello/hello.h", "// patched locally\n");

  env
    .depforge_cmd()
    .args(["linux", "--configurations", "Release"])
    .env("NO_EXTRACT", "1")
    .env("NO_REMOVE_BUILD_DIR", "yes")
    .assert()
    .success();

  let installed = fs::read_to_string(env.path("dependencies/linux/x64/Release/include/hello.h")).unwrap();
  assert_eq!(installed, "// patched locally\n");
}

#[test]
fn json_report() {
  let env = TestEnv::linux();
  env.header_library("hello");
  env.build_order(&["hello"]);

  let output = env
    .depforge_cmd()
    .args(["linux", "--configurations", "Release Debug", "--format", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["platform"], "linux");
  assert_eq!(report["arch"], "x64");
  let builds = report["builds"].as_array().unwrap();
  assert_eq!(builds.len(), 2);
  assert_eq!(builds[0]["configuration"], "Release");
  assert_eq!(builds[1]["configuration"], "Debug");
  assert_eq!(builds[0]["library"], "hello");
}
