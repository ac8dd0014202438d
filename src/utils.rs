//! Filesystem helpers: atomic writes and staging copies

use crate::core::error::{RailResult, ResultExt};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically replace `path` with `contents`
///
/// Writes a temp file in the target directory, fsyncs it, then renames it over
/// the target. A crash leaves either the old or the new file, never a torn one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> RailResult<()> {
  let parent = match path.parent() {
    Some(p) if !p.as_os_str().is_empty() => p,
    _ => Path::new("."),
  };
  fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;

  let mut temp =
    NamedTempFile::new_in(parent).with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
  temp
    .write_all(contents)
    .with_context(|| format!("Failed to write {}", path.display()))?;
  temp
    .as_file()
    .sync_all()
    .with_context(|| format!("Failed to fsync {}", path.display()))?;
  temp
    .persist(path)
    .with_context(|| format!("Failed to replace {}", path.display()))?;
  Ok(())
}

/// Copy a file or a directory tree into `dest_dir`, keeping its file name
pub fn copy_into(src: &Path, dest_dir: &Path) -> RailResult<()> {
  let name = src
    .file_name()
    .ok_or_else(|| crate::core::error::RailError::message(format!("Cannot copy {}: no file name", src.display())))?;
  let dest = dest_dir.join(name);

  if src.is_dir() {
    copy_dir_all(src, &dest)
  } else {
    fs::copy(src, &dest).with_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))?;
    Ok(())
  }
}

/// Recursively copy a directory
pub fn copy_dir_all(src: &Path, dest: &Path) -> RailResult<()> {
  fs::create_dir_all(dest).with_context(|| format!("Failed to create directory {}", dest.display()))?;

  for entry in fs::read_dir(src).with_context(|| format!("Failed to read directory {}", src.display()))? {
    let entry = entry?;
    let from = entry.path();
    let to = dest.join(entry.file_name());
    if entry.file_type()?.is_dir() {
      copy_dir_all(&from, &to)?;
    } else {
      fs::copy(&from, &to).with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
    }
  }
  Ok(())
}

/// Remove a directory tree if present
pub fn remove_dir_if_exists(path: &Path) -> RailResult<()> {
  if path.exists() {
    fs::remove_dir_all(path).with_context(|| format!("Failed to remove {}", path.display()))?;
  }
  Ok(())
}
