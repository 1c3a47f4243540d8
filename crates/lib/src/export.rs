//! IDE-integration export.
//!
//! Serializes one target's resolved compile configuration to JSON for IDE
//! tooling to ingest. Pure formatting; regenerated on demand with no effect
//! on the build graph.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::target::Target;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetExport {
  name: String,
  kind: String,
  platform: String,
  build_type: String,
  includes: Vec<String>,
  defines: Vec<String>,
  compiler_flags: Vec<String>,
  c_flags: Vec<String>,
  cxx_flags: Vec<String>,
  linker_flags: Vec<String>,
}

/// Resolve a target's export view under one configuration.
pub fn export_target(target: &Target, config: &BuildConfig) -> TargetExport {
  TargetExport {
    name: target.name.clone(),
    kind: target.kind.as_str().to_string(),
    platform: config.platform.as_str().to_string(),
    build_type: config.build_type.as_str().to_string(),
    includes: target.includes.iter().map(|p| p.display().to_string()).collect(),
    defines: target.defines.clone(),
    compiler_flags: target.compiler_flags.clone(),
    c_flags: target.c_flags.clone(),
    cxx_flags: target.cxx_flags.clone(),
    linker_flags: target.linker_flags.clone(),
  }
}

/// Render the export document as pretty-printed JSON.
pub fn render(target: &Target, config: &BuildConfig) -> String {
  // TargetExport contains only strings; serialization cannot fail.
  serde_json::to_string_pretty(&export_target(target, config)).unwrap_or_default()
}

/// Write the export document to `path`, creating parent directories.
pub fn write_export(target: &Target, config: &BuildConfig, path: &Path) -> Result<(), BuildError> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::write(path, render(target, config))?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{BuildType, Platform};
  use crate::target::TargetKind;
  use std::path::PathBuf;

  fn sample() -> (Target, BuildConfig) {
    let mut target = Target::new("app", TargetKind::Executable);
    target.includes.push(PathBuf::from("src"));
    target.defines.push("APP=1".to_string());
    target.cxx_flags.push("--std=c++20".to_string());
    let config = BuildConfig::new(Platform::Desktop, BuildType::Debug, PathBuf::from("out"));
    (target, config)
  }

  #[test]
  fn render_contains_resolved_fields() {
    let (target, config) = sample();
    let json = render(&target, &config);
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["name"], "app");
    assert_eq!(value["kind"], "executable");
    assert_eq!(value["buildType"], "debug");
    assert_eq!(value["includes"][0], "src");
    assert_eq!(value["cxxFlags"][0], "--std=c++20");
  }

  #[test]
  fn write_export_creates_parents() {
    let (target, config) = sample();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("ide/app.json");
    write_export(&target, &config, &path).unwrap();
    assert!(path.exists());
  }
}
