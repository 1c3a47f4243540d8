//! Asset pipeline: copying declared runtime resources next to the binaries.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::BuildError;
use crate::stale::Freshness;

/// Copy one asset, overwriting any prior file at the destination.
///
/// Parent directories are created as needed; bytes are copied verbatim.
pub fn copy_asset(source: &Path, destination: &Path) -> Result<(), BuildError> {
  if !source.exists() {
    return Err(BuildError::AssetMissing(source.to_path_buf()));
  }
  if destination.exists() {
    fs::remove_file(destination)?;
  }
  if let Some(parent) = destination.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::copy(source, destination)?;
  info!(source = %source.display(), destination = %destination.display(), "copied asset");
  Ok(())
}

/// Freshness of a copied asset: fresh when the destination exists and is not
/// older than the source.
pub fn asset_freshness(source: &Path, destination: &Path) -> Freshness {
  let Ok(destination_time) = fs::metadata(destination).and_then(|m| m.modified()) else {
    return Freshness::Missing;
  };
  match fs::metadata(source).and_then(|m| m.modified()) {
    Ok(source_time) if source_time <= destination_time => Freshness::Fresh,
    _ => Freshness::Stale,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::{set_mtime, touch};
  use std::time::{Duration, SystemTime};
  use tempfile::TempDir;

  #[test]
  fn missing_source_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = copy_asset(&dir.path().join("missing.png"), &dir.path().join("out/missing.png"));
    assert!(matches!(err, Err(BuildError::AssetMissing(_))));
  }

  #[test]
  fn copy_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("font.ttf");
    fs::write(&source, b"glyphs").unwrap();

    let destination = dir.path().join("bin/assets/font.ttf");
    copy_asset(&source, &destination).unwrap();
    assert_eq!(fs::read(&destination).unwrap(), b"glyphs");
  }

  #[test]
  fn copy_overwrites_prior_file() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("font.ttf");
    let destination = dir.path().join("font-copy.ttf");
    fs::write(&source, b"new").unwrap();
    fs::write(&destination, b"old").unwrap();

    copy_asset(&source, &destination).unwrap();
    assert_eq!(fs::read(&destination).unwrap(), b"new");
  }

  #[test]
  fn freshness_tracks_destination_age() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("font.ttf");
    let destination = dir.path().join("copy.ttf");
    touch(&source);

    assert_eq!(asset_freshness(&source, &destination), Freshness::Missing);

    touch(&destination);
    let past = SystemTime::now() - Duration::from_secs(60);
    set_mtime(&source, past);
    assert_eq!(asset_freshness(&source, &destination), Freshness::Fresh);

    set_mtime(&destination, past - Duration::from_secs(60));
    assert_eq!(asset_freshness(&source, &destination), Freshness::Stale);
  }
}
