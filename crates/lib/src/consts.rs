pub const APP_NAME: &str = "depforge";

/// Target configurations built when none are requested, in build order.
pub const DEFAULT_CONFIGURATIONS: &[&str] = &["RelWithDebInfo", "Release", "Debug"];

/// Directory under `build/<platform>/` holding downloaded archives.
pub const DEFAULT_STAGING_NAME: &str = "X";

pub const DEFAULT_INSTALL_DIR_NAME: &str = "dependencies";
pub const DEFAULT_TOOLS_DIR_NAME: &str = "tools";
pub const SCRIPTS_DIR_NAME: &str = "scripts";
pub const BUILD_DIR_NAME: &str = "build";

/// Per-platform file listing the build order.
pub const BUILD_ORDER_FILE: &str = "build.config";
pub const CONFIG_EXTENSION: &str = "config";

pub const DEFAULT_CMAKE_PROGRAM: &str = "cmake";
pub const DEFAULT_MAKE_PROGRAM: &str = "make";
pub const DEFAULT_CMAKE_BUILD_SUBDIR: &str = "buildtemp";

/// Lines of a broken archive shown when extraction fails.
pub const EXTRACT_FAILURE_TAIL_LINES: usize = 10;

/// Suffix of in-flight downloads; renamed away once complete.
pub const PARTIAL_DOWNLOAD_SUFFIX: &str = ".part";

/// Prefix of the variables exported to every spawned command.
pub const ENV_PREFIX: &str = "DEPFORGE_";
