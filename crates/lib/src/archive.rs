//! Archive extraction with one-level stripping.
//!
//! Upstream source archives wrap their contents in a top-level folder whose
//! name varies (`zlib-1.3.1/`, `libpng-1.6.43/`, ...). Every entry is unpacked
//! with its first path component removed so the contents land directly in
//! the destination directory.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("unsupported archive format: {}", .0.display())]
  Unsupported(PathBuf),

  #[error("failed to read archive: {0}")]
  Io(#[from] io::Error),

  #[error("failed to read zip archive: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("archive entry escapes the destination: {}", .0.display())]
  UnsafeEntry(PathBuf),
}

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
  TarGz,
  Tar,
  Zip,
}

impl ArchiveKind {
  /// Detect the format from a file name or URL path.
  pub fn from_name(name: &str) -> Option<Self> {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
      Some(Self::TarGz)
    } else if lower.ends_with(".tar") {
      Some(Self::Tar)
    } else if lower.ends_with(".zip") {
      Some(Self::Zip)
    } else {
      None
    }
  }

  pub fn from_path(path: &Path) -> Option<Self> {
    path.file_name().and_then(|n| n.to_str()).and_then(Self::from_name)
  }

  pub fn extension(&self) -> &'static str {
    match self {
      Self::TarGz => ".tar.gz",
      Self::Tar => ".tar",
      Self::Zip => ".zip",
    }
  }
}

/// Unpack `archive_path` into `dest`, dropping the first path component of
/// every entry. Returns the number of entries written.
pub fn unpack_stripped(archive_path: &Path, dest: &Path) -> Result<usize, ArchiveError> {
  let kind = ArchiveKind::from_path(archive_path).ok_or_else(|| ArchiveError::Unsupported(archive_path.to_path_buf()))?;

  fs::create_dir_all(dest)?;

  let file = BufReader::new(File::open(archive_path)?);
  let written = match kind {
    ArchiveKind::TarGz => unpack_tar(GzDecoder::new(file), dest)?,
    ArchiveKind::Tar => unpack_tar(file, dest)?,
    ArchiveKind::Zip => unpack_zip(file, dest)?,
  };

  info!(archive = ?archive_path, dest = ?dest, entries = written, "unpacked archive");
  Ok(written)
}

fn unpack_tar<R: Read>(reader: R, dest: &Path) -> Result<usize, ArchiveError> {
  let mut archive = Archive::new(reader);
  let root = dest.canonicalize()?;
  let mut written = 0;

  for entry in archive.entries()? {
    let mut entry = entry?;
    let path = entry.path()?.into_owned();

    let Some(stripped) = strip_first_component(&path)? else {
      continue;
    };

    let dest_path = dest.join(&stripped);
    create_parent_within(&root, &dest_path)?;

    match entry.header().entry_type() {
      EntryType::Directory => fs::create_dir_all(&dest_path)?,
      EntryType::Link => {
        // Hard link targets name entries of the same archive, top folder included.
        let target = entry
          .link_name()?
          .map(|name| name.into_owned())
          .ok_or_else(|| ArchiveError::UnsafeEntry(path.clone()))?;
        let target = strip_first_component(&target)?.ok_or(ArchiveError::UnsafeEntry(target))?;
        remove_existing(&dest_path)?;
        fs::hard_link(dest.join(target), &dest_path)?;
      }
      _ => {
        remove_existing(&dest_path)?;
        entry.unpack(&dest_path)?;
      }
    }
    written += 1;
  }

  Ok(written)
}

fn unpack_zip<R: Read + io::Seek>(reader: R, dest: &Path) -> Result<usize, ArchiveError> {
  let mut archive = zip::ZipArchive::new(reader)?;
  let root = dest.canonicalize()?;
  let mut written = 0;

  for i in 0..archive.len() {
    let mut file = archive.by_index(i)?;
    let path = file
      .enclosed_name()
      .ok_or_else(|| ArchiveError::UnsafeEntry(PathBuf::from(file.name())))?;

    let Some(stripped) = strip_first_component(&path)? else {
      continue;
    };

    let dest_path = dest.join(&stripped);
    create_parent_within(&root, &dest_path)?;
    if file.is_dir() {
      fs::create_dir_all(&dest_path)?;
    } else {
      let mut out = File::create(&dest_path)?;
      io::copy(&mut file, &mut out)?;
      #[cfg(unix)]
      if let Some(mode) = file.unix_mode() {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode))?;
      }
    }
    written += 1;
  }

  Ok(written)
}

/// Create the parent of `path`, refusing to go through a symlink that
/// resolves outside `root` (an earlier entry may have planted one).
fn create_parent_within(root: &Path, path: &Path) -> Result<(), ArchiveError> {
  let Some(parent) = path.parent() else {
    return Ok(());
  };

  let existing = parent.ancestors().find(|p| p.exists()).unwrap_or(root);
  if !existing.canonicalize()?.starts_with(root) {
    return Err(ArchiveError::UnsafeEntry(path.to_path_buf()));
  }

  fs::create_dir_all(parent)?;
  if !parent.canonicalize()?.starts_with(root) {
    return Err(ArchiveError::UnsafeEntry(path.to_path_buf()));
  }
  Ok(())
}

/// Drop a previous file or symlink at `path` so unpacking never writes through it.
fn remove_existing(path: &Path) -> io::Result<()> {
  match fs::symlink_metadata(path) {
    Ok(meta) if !meta.is_dir() => fs::remove_file(path),
    _ => Ok(()),
  }
}

/// Remove the leading component of an archive entry path.
///
/// Returns `None` for the top-level entry itself (nothing left after
/// stripping) and rejects entries that could escape the destination.
fn strip_first_component(path: &Path) -> Result<Option<PathBuf>, ArchiveError> {
  let mut components = path.components().filter(|c| !matches!(c, Component::CurDir));
  components.next();

  let mut stripped = PathBuf::new();
  for component in components {
    match component {
      Component::Normal(part) => stripped.push(part),
      _ => return Err(ArchiveError::UnsafeEntry(path.to_path_buf())),
    }
  }

  if stripped.as_os_str().is_empty() {
    debug!(entry = ?path, "skipping top-level archive entry");
    return Ok(None);
  }
  Ok(Some(stripped))
}

/// Last `lines` lines of a file, decoded lossily.
///
/// Used to show what a broken download actually contains; an HTML error page
/// saved under an archive name is the usual culprit. Returns an empty string
/// when the file cannot be read.
pub fn tail_lines(path: &Path, lines: usize) -> String {
  let Ok(bytes) = fs::read(path) else {
    return String::new();
  };
  let text = String::from_utf8_lossy(&bytes);
  let all: Vec<&str> = text.lines().collect();
  let start = all.len().saturating_sub(lines);
  all[start..].join("\n")
}
