//! Target model: the declarative description of one build unit.
//!
//! A [`Target`] is pure data. It is constructed once from configuration
//! before any graph work begins and stays immutable for the whole
//! invocation; link references are shared [`Arc`]s that the engine only ever
//! reads through.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::external::ExternalTarget;

/// What a target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
  /// Compiled but never linked; a reusable object collection.
  Objects,
  /// Archived into `lib<name>.a`.
  StaticLibrary,
  /// Linked into a runnable binary.
  Executable,
}

impl TargetKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      TargetKind::Objects => "objects",
      TargetKind::StaticLibrary => "static-library",
      TargetKind::Executable => "executable",
    }
  }
}

/// One runtime asset to copy next to the produced binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
  pub source: PathBuf,
  /// Destination relative to the binary directory; defaults to mirroring
  /// the source path.
  pub destination: Option<PathBuf>,
}

impl Asset {
  /// Parse a `"source"` or `"source:destination"` pattern.
  pub fn parse(pattern: &str) -> Result<Self, BuildError> {
    let mut parts = pattern.splitn(2, ':');
    let source = parts.next().filter(|s| !s.is_empty()).ok_or_else(|| {
      BuildError::Configuration(format!("invalid asset pattern: {pattern:?}"))
    })?;
    let destination = parts.next().filter(|s| !s.is_empty()).map(PathBuf::from);
    Ok(Asset {
      source: PathBuf::from(source),
      destination,
    })
  }

  /// Where the asset lands under the binary directory.
  pub fn destination_in(&self, bin_dir: &Path) -> PathBuf {
    match &self.destination {
      Some(destination) => bin_dir.join(destination),
      None => bin_dir.join(&self.source),
    }
  }
}

/// A named build unit.
///
/// All flag lists are ordered opaque tokens passed verbatim to the
/// toolchain; the engine never interprets them.
#[derive(Debug)]
pub struct Target {
  pub name: String,
  pub kind: TargetKind,
  /// Ordered, duplicate-free source list. `.c` selects the C compiler,
  /// every other extension the C++ compiler.
  pub sources: Vec<PathBuf>,
  pub includes: Vec<PathBuf>,
  pub defines: Vec<String>,
  pub compiler_flags: Vec<String>,
  pub c_flags: Vec<String>,
  pub cxx_flags: Vec<String>,
  pub linker_flags: Vec<String>,
  /// Other targets whose object closures are linked into this one.
  /// Declaration order is preserved; linkers are order sensitive.
  pub link_libraries: Vec<Arc<Target>>,
  pub assets: Vec<Asset>,
}

impl Target {
  /// A target with every list empty, so downstream appends are always safe.
  pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
    Target {
      name: name.into(),
      kind,
      sources: Vec::new(),
      includes: Vec::new(),
      defines: Vec::new(),
      compiler_flags: Vec::new(),
      c_flags: Vec::new(),
      cxx_flags: Vec::new(),
      linker_flags: Vec::new(),
      link_libraries: Vec::new(),
      assets: Vec::new(),
    }
  }
}

/// A validated collection of targets and external targets.
#[derive(Debug, Default)]
pub struct Project {
  targets: Vec<Arc<Target>>,
  externals: Vec<ExternalTarget>,
}

impl Project {
  /// Validate and assemble a project.
  ///
  /// Rejects duplicate names (across targets and externals) and duplicate
  /// source paths within a target, before any graph work begins.
  pub fn new(targets: Vec<Arc<Target>>, externals: Vec<ExternalTarget>) -> Result<Self, BuildError> {
    let mut names: HashSet<&str> = HashSet::new();
    for target in &targets {
      if !names.insert(&target.name) {
        return Err(BuildError::DuplicateTargetName(target.name.clone()));
      }
      let mut sources: HashSet<&Path> = HashSet::new();
      for source in &target.sources {
        if !sources.insert(source) {
          return Err(BuildError::DuplicateSource {
            target: target.name.clone(),
            path: source.clone(),
          });
        }
      }
    }
    for external in &externals {
      if !names.insert(&external.name) {
        return Err(BuildError::DuplicateTargetName(external.name.clone()));
      }
    }
    Ok(Project { targets, externals })
  }

  pub fn target(&self, name: &str) -> Option<&Arc<Target>> {
    self.targets.iter().find(|t| t.name == name)
  }

  pub fn external(&self, name: &str) -> Option<&ExternalTarget> {
    self.externals.iter().find(|e| e.name == name)
  }

  pub fn targets(&self) -> &[Arc<Target>] {
    &self.targets
  }

  pub fn externals(&self) -> &[ExternalTarget] {
    &self.externals
  }
}
