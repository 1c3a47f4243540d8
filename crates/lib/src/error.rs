//! Error types for the build engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the build engine.
///
/// Configuration errors (duplicate names, path collisions, cycles) are always
/// detected before any external process is spawned.
#[derive(Debug, Error)]
pub enum BuildError {
  /// Invalid configuration that does not fit a more specific variant.
  #[error("configuration error: {0}")]
  Configuration(String),

  /// Two targets (or a target and an external) share a name.
  #[error("duplicate target name: {0}")]
  DuplicateTargetName(String),

  /// A target lists the same source file twice.
  #[error("duplicate source `{path}` in target `{target}`", path = .path.display())]
  DuplicateSource { target: String, path: PathBuf },

  /// Two distinct sources derive the same object path.
  #[error(
    "object path collision: `{first}` and `{second}` both map to `{object}`",
    first = .first.display(),
    second = .second.display(),
    object = .object.display()
  )]
  ObjectPathCollision {
    first: PathBuf,
    second: PathBuf,
    object: PathBuf,
  },

  /// The link graph contains a cycle.
  #[error("cyclic link dependency: {}", .cycle.join(" -> "))]
  CyclicDependency { cycle: Vec<String> },

  /// Reverse object-to-source lookup failed.
  #[error("no source in target `{target}` produces object `{object}`", object = .object.display())]
  SourceNotFound { target: String, object: PathBuf },

  /// A verb or link reference named a target that does not exist.
  #[error("unknown target: {0}")]
  UnknownTarget(String),

  /// An external process exited with a non-zero status.
  #[error("command failed with exit code {code:?}: {command}")]
  ProcessFailed { command: String, code: Option<i32> },

  /// A scheduled task panicked instead of completing.
  #[error("task panicked: {0}")]
  TaskPanic(String),

  /// A declared asset source does not exist.
  #[error("asset source does not exist: {path}", path = .0.display())]
  AssetMissing(PathBuf),

  /// I/O error while touching the output tree.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl BuildError {
  /// True for errors that indicate broken configuration rather than a
  /// failed build step.
  pub fn is_configuration(&self) -> bool {
    matches!(
      self,
      BuildError::Configuration(_)
        | BuildError::DuplicateTargetName(_)
        | BuildError::DuplicateSource { .. }
        | BuildError::ObjectPathCollision { .. }
        | BuildError::CyclicDependency { .. }
        | BuildError::UnknownTarget(_)
    )
  }
}
