//! Host detection used for the `<arch>` segment of install paths.

pub mod arch;

use arch::Arch;

/// Architecture label used in install paths when no generator arch is configured.
///
/// Falls back to the raw `std::env::consts::ARCH` value for architectures
/// without a dedicated variant.
pub fn host_arch_label() -> String {
  Arch::current()
    .map(|a| a.as_str().to_string())
    .unwrap_or_else(|| std::env::consts::ARCH.to_string())
}

/// Short host description for diagnostics, e.g. `x86_64-linux`.
pub fn host_description() -> String {
  format!("{}-{}", host_arch_label(), std::env::consts::OS)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn host_arch_label_is_never_empty() {
    assert!(!host_arch_label().is_empty());
  }

  #[test]
  fn host_description_includes_os() {
    assert!(host_description().ends_with(std::env::consts::OS));
  }
}
