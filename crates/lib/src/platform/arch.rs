use std::fmt;

/// CPU architectures a dependency tree can be built for.
///
/// CMake generators and install trees name the same architecture
/// differently (`x64` for Visual Studio, `x86_64` elsewhere), so labels are
/// parsed leniently and rendered per consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
  X86,
  X86_64,
  Arm,
  Aarch64,
}

impl Arch {
  pub fn current() -> Option<Self> {
    Self::from_label(std::env::consts::ARCH)
  }

  /// Parse a Rust, CMake or Visual Studio architecture label.
  pub fn from_label(label: &str) -> Option<Self> {
    match label.to_ascii_lowercase().as_str() {
      "x86" | "win32" | "i386" | "i686" => Some(Self::X86),
      "x86_64" | "x64" | "amd64" => Some(Self::X86_64),
      "arm" | "armv7" => Some(Self::Arm),
      "aarch64" | "arm64" => Some(Self::Aarch64),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::X86 => "x86",
      Self::X86_64 => "x86_64",
      Self::Arm => "arm",
      Self::Aarch64 => "aarch64",
    }
  }

  /// Name accepted by `cmake -A` for Visual Studio generators.
  pub fn msvc_name(&self) -> &'static str {
    match self {
      Self::X86 => "Win32",
      Self::X86_64 => "x64",
      Self::Arm => "ARM",
      Self::Aarch64 => "ARM64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
