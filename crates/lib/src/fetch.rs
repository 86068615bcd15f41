//! Source archive transport.
//!
//! Downloads go through the [`Fetcher`] trait so the engine can be driven
//! with a different transport (tests use a counting fake). The default
//! [`HttpFetcher`] handles `http(s)://` with blocking `reqwest` and
//! `file://` with a plain copy.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{APP_NAME, PARTIAL_DOWNLOAD_SUFFIX};

#[derive(Debug, Error)]
pub enum FetchError {
  /// The request could not be sent or its body could not be read.
  #[error("request to {url} failed: {message}")]
  Request { url: String, message: String },

  /// The server answered with a non-success status.
  #[error("fetching {url} returned HTTP {status}")]
  Status { url: String, status: u16 },

  /// The downloaded content does not match the configured digest.
  #[error("hash mismatch for {url}: expected {expected}, got {actual}")]
  HashMismatch {
    url: String,
    expected: String,
    actual: String,
  },

  #[error("unsupported URL scheme: {0}")]
  UnsupportedScheme(String),

  #[error("failed to write '{}': {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Transport used by the download stage and the tool bootstrap.
pub trait Fetcher: Send + Sync {
  /// Fetch `url` and write its content to `dest`.
  fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Default transport: `http://`, `https://` and `file://` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
  fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
    if let Some(local) = url.strip_prefix("file://") {
      debug!(source = %local, dest = ?dest, "copying local file");
      fs::copy(local, dest).map_err(|source| FetchError::Io {
        path: dest.to_path_buf(),
        source,
      })?;
      return Ok(());
    }

    if !(url.starts_with("http://") || url.starts_with("https://")) {
      return Err(FetchError::UnsupportedScheme(url.to_string()));
    }

    let request_error = |e: reqwest::Error| FetchError::Request {
      url: url.to_string(),
      message: e.to_string(),
    };

    let client = reqwest::blocking::Client::builder()
      .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(request_error)?;
    let response = client.get(url).send().map_err(request_error)?;
    if !response.status().is_success() {
      return Err(FetchError::Status {
        url: url.to_string(),
        status: response.status().as_u16(),
      });
    }

    let bytes = response.bytes().map_err(request_error)?;
    fs::write(dest, &bytes).map_err(|source| FetchError::Io {
      path: dest.to_path_buf(),
      source,
    })?;

    debug!(url = %url, size = bytes.len(), "response written");
    Ok(())
  }
}

/// Download `url` to `dest` through a `.part` file.
///
/// `dest` only appears once the transfer finished and, when `expected_sha256`
/// is given, the digest matched. A failed or interrupted download therefore
/// never looks like a cached archive.
pub fn download_to(
  fetcher: &dyn Fetcher,
  url: &str,
  dest: &Path,
  expected_sha256: Option<&str>,
) -> Result<(), FetchError> {
  let io_error = |path: &Path| {
    let path = path.to_path_buf();
    move |source| FetchError::Io { path, source }
  };

  if let Some(parent) = dest.parent() {
    fs::create_dir_all(parent).map_err(io_error(parent))?;
  }

  let mut partial = dest.as_os_str().to_owned();
  partial.push(PARTIAL_DOWNLOAD_SUFFIX);
  let partial = PathBuf::from(partial);

  info!(url = %url, dest = ?dest, "downloading");
  if let Err(e) = fetcher.fetch(url, &partial) {
    let _ = fs::remove_file(&partial);
    return Err(e);
  }

  if let Some(expected) = expected_sha256 {
    let actual = hash_file(&partial).map_err(io_error(partial.as_path()))?;
    if !actual.eq_ignore_ascii_case(expected) {
      let _ = fs::remove_file(&partial);
      return Err(FetchError::HashMismatch {
        url: url.to_string(),
        expected: expected.to_string(),
        actual,
      });
    }
    debug!(sha256 = %actual, "hash verified");
  }

  fs::rename(&partial, dest).map_err(io_error(dest))?;
  info!(dest = ?dest, "download complete");
  Ok(())
}

/// Lowercase hex SHA-256 of a file.
pub fn hash_file(path: &Path) -> io::Result<String> {
  let mut file = File::open(path)?;
  let mut hasher = Sha256::new();
  let mut buf = [0u8; 64 * 1024];
  loop {
    let n = file.read(&mut buf)?;
    if n == 0 {
      break;
    }
    hasher.update(&buf[..n]);
  }
  Ok(hex::encode(hasher.finalize()))
}
