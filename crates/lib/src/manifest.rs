//! Declarative project manifest (`forge.toml`).
//!
//! The manifest is configuration data only: it declares targets, their flag
//! lists, link references by name, asset patterns, and external (foreign)
//! builds. Parsing resolves the name references into shared [`Target`]
//! handles and hands the engine a validated [`Project`]; nothing in the
//! engine reads TOML.
//!
//! ```toml
//! [target.core]
//! kind = "static-library"
//! sources = ["src/core/string.cpp"]
//! includes = ["src"]
//!
//! [target.app]
//! kind = "executable"
//! sources = ["src/app/main.cpp"]
//! link = ["core"]
//! assets = ["assets/font.ttf:fonts/default.ttf"]
//!
//! [external.freetype]
//! path = "libs/freetype"
//! artifact = "lib/libfreetype.a"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::config::{BuildConfig, BuildType};
use crate::error::BuildError;
use crate::external::ExternalTarget;
use crate::target::{Asset, Project, Target, TargetKind};

/// Errors raised while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read manifest {path}: {error}", path = .path.display())]
  Read {
    path: PathBuf,
    #[source]
    error: std::io::Error,
  },

  #[error("failed to parse manifest: {0}")]
  Parse(#[from] toml::de::Error),

  #[error("target `{target}` links unknown target `{link}`")]
  UnknownLink { target: String, link: String },

  #[error(transparent)]
  Build(#[from] BuildError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
  #[serde(default)]
  target: BTreeMap<String, RawTarget>,
  #[serde(default)]
  external: BTreeMap<String, RawExternal>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawTarget {
  kind: TargetKind,
  #[serde(default)]
  sources: Vec<PathBuf>,
  #[serde(default)]
  includes: Vec<PathBuf>,
  #[serde(default)]
  defines: Vec<String>,
  #[serde(default)]
  compiler_flags: Vec<String>,
  #[serde(default)]
  c_flags: Vec<String>,
  #[serde(default)]
  cxx_flags: Vec<String>,
  #[serde(default)]
  linker_flags: Vec<String>,
  /// Extra compiler flags applied only under the matching build type.
  #[serde(default)]
  release_flags: Vec<String>,
  #[serde(default)]
  debug_flags: Vec<String>,
  /// Names of other targets to link, in order.
  #[serde(default)]
  link: Vec<String>,
  /// `"source"` or `"source:destination"` patterns.
  #[serde(default)]
  assets: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawExternal {
  path: PathBuf,
  #[serde(default)]
  configure_flags: Vec<String>,
  #[serde(default)]
  build_flags: Vec<String>,
  #[serde(default)]
  install_flags: Vec<String>,
  artifact: Option<PathBuf>,
}

/// Load and resolve a manifest file into a validated [`Project`].
pub fn load_project(path: &Path, config: &BuildConfig) -> Result<Project, ManifestError> {
  let text = fs::read_to_string(path).map_err(|error| ManifestError::Read {
    path: path.to_path_buf(),
    error,
  })?;
  let raw: RawManifest = toml::from_str(&text)?;
  resolve(raw, config)
}

fn resolve(raw: RawManifest, config: &BuildConfig) -> Result<Project, ManifestError> {
  let mut resolved: HashMap<String, Arc<Target>> = HashMap::new();
  let mut targets = Vec::new();
  for name in raw.target.keys() {
    let target = resolve_target(name, &raw.target, config, &mut resolved, &mut Vec::new())?;
    targets.push(target);
  }

  let externals = raw
    .external
    .into_iter()
    .map(|(name, raw)| {
      let mut external = ExternalTarget::new(name, raw.path);
      external.configure_flags = raw.configure_flags;
      external.build_flags = raw.build_flags;
      external.install_flags = raw.install_flags;
      external.artifact = raw.artifact;
      external
    })
    .collect();

  Ok(Project::new(targets, externals)?)
}

fn resolve_target(
  name: &str,
  raw_targets: &BTreeMap<String, RawTarget>,
  config: &BuildConfig,
  resolved: &mut HashMap<String, Arc<Target>>,
  visiting: &mut Vec<String>,
) -> Result<Arc<Target>, ManifestError> {
  if let Some(target) = resolved.get(name) {
    return Ok(target.clone());
  }
  if let Some(pos) = visiting.iter().position(|n| n == name) {
    let mut cycle: Vec<String> = visiting[pos..].to_vec();
    cycle.push(name.to_string());
    return Err(BuildError::CyclicDependency { cycle }.into());
  }

  let raw = raw_targets
    .get(name)
    .ok_or_else(|| BuildError::UnknownTarget(name.to_string()))?;

  visiting.push(name.to_string());
  let mut link_libraries = Vec::new();
  for link in &raw.link {
    if !raw_targets.contains_key(link) {
      return Err(ManifestError::UnknownLink {
        target: name.to_string(),
        link: link.clone(),
      });
    }
    link_libraries.push(resolve_target(link, raw_targets, config, resolved, visiting)?);
  }
  visiting.pop();

  let mut target = Target::new(name, raw.kind);
  target.sources = raw.sources.clone();
  target.includes = raw.includes.clone();
  target.defines = raw.defines.clone();
  target.compiler_flags = raw.compiler_flags.clone();
  match config.build_type {
    BuildType::Release => target.compiler_flags.extend(raw.release_flags.iter().cloned()),
    BuildType::Debug => target.compiler_flags.extend(raw.debug_flags.iter().cloned()),
  }
  target.c_flags = raw.c_flags.clone();
  target.cxx_flags = raw.cxx_flags.clone();
  target.linker_flags = raw.linker_flags.clone();
  target.link_libraries = link_libraries;
  target.assets = raw
    .assets
    .iter()
    .map(|pattern| Asset::parse(pattern))
    .collect::<Result<Vec<_>, _>>()?;

  let target = Arc::new(target);
  resolved.insert(name.to_string(), target.clone());
  Ok(target)
}
