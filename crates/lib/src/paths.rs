//! Deterministic derivation of object, dependency-file, and binary paths.
//!
//! Sources are project-relative paths; an object lands at
//! `<obj root>/<source>.o` and its dependency file at `<dep root>/<source>.d`.
//! The derivation is target-independent so that a source listed by several
//! targets compiles exactly once, and it must be injective across every
//! source compiled in one session; [`Layout::check_injective`] rejects
//! collisions before any process is spawned.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{BuildConfig, Platform};
use crate::error::BuildError;
use crate::target::{Target, TargetKind};

/// Derives artifact paths under one output root.
#[derive(Debug, Clone)]
pub struct Layout {
  obj_dir: PathBuf,
  dep_dir: PathBuf,
  bin_dir: PathBuf,
  lib_dir: PathBuf,
  platform: Platform,
}

impl Layout {
  pub fn new(config: &BuildConfig) -> Self {
    Layout {
      obj_dir: config.obj_dir(),
      dep_dir: config.dep_dir(),
      bin_dir: config.bin_dir(),
      lib_dir: config.lib_dir(),
      platform: config.platform,
    }
  }

  pub fn bin_dir(&self) -> &Path {
    &self.bin_dir
  }

  /// Object path for a source file.
  pub fn object_path(&self, source: &Path) -> PathBuf {
    self.obj_dir.join(source.with_extension("o"))
  }

  /// Dependency-file path for a source file (compiler-emitted header list).
  pub fn dep_file_path(&self, source: &Path) -> PathBuf {
    self.dep_dir.join(source.with_extension("d"))
  }

  /// All object paths for a target's own sources, in declaration order.
  pub fn target_objects(&self, target: &Target) -> Vec<PathBuf> {
    target.sources.iter().map(|s| self.object_path(s)).collect()
  }

  /// Reverse lookup: which source of `target` produces `object`.
  ///
  /// Recomputes every source's object path and matches; a miss means the
  /// target's source list and the artifact tree have drifted apart.
  pub fn source_for_object<'t>(&self, object: &Path, target: &'t Target) -> Result<&'t Path, BuildError> {
    target
      .sources
      .iter()
      .map(PathBuf::as_path)
      .find(|source| self.object_path(source) == object)
      .ok_or_else(|| BuildError::SourceNotFound {
        target: target.name.clone(),
        object: object.to_path_buf(),
      })
  }

  /// Final artifact path for a target, or `None` for `Objects` targets.
  ///
  /// Executables get the platform suffix (`.html` under the web runtime);
  /// static libraries follow the `lib<name>.a` convention.
  pub fn binary_path(&self, target: &Target) -> Option<PathBuf> {
    match target.kind {
      TargetKind::Objects => None,
      TargetKind::StaticLibrary => Some(self.lib_dir.join(format!("lib{}.a", target.name))),
      TargetKind::Executable => {
        let path = self.bin_dir.join(&target.name);
        match self.platform {
          Platform::Desktop => Some(path),
          Platform::Web => Some(path.with_extension("html")),
        }
      }
    }
  }

  /// Verify object-path derivation is injective across the given targets'
  /// sources.
  ///
  /// The same source listed by two targets maps to the same object and is
  /// fine (it compiles once); two *distinct* sources mapping to one object
  /// would silently overwrite each other and are rejected.
  pub fn check_injective(&self, targets: &[Arc<Target>]) -> Result<(), BuildError> {
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
    for target in targets {
      for source in &target.sources {
        let object = self.object_path(source);
        match claimed.get(&object) {
          None => {
            claimed.insert(object, source);
          }
          Some(first) if *first == source.as_path() => {}
          Some(first) => {
            return Err(BuildError::ObjectPathCollision {
              first: first.to_path_buf(),
              second: source.clone(),
              object,
            });
          }
        }
      }
    }
    Ok(())
  }
}
