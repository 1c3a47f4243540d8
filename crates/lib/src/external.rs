//! Foreign (CMake-style) builds driven as opaque targets.
//!
//! An external target exposes a three-step protocol: `configure` runs once
//! per clean build directory, `build` is idempotent and safe to re-invoke,
//! and `install` copies the foreign build's output into the shared output
//! root, elevating privileges where the platform requires it. The engine
//! tracks only whether the declared install artifact exists; the foreign
//! build's internal incremental state stays its own business.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::toolchain::Invocation;

/// A foreign build tree driven through CMake.
#[derive(Debug, Clone)]
pub struct ExternalTarget {
  pub name: String,
  /// Directory holding the foreign project's own build description.
  pub source_dir: PathBuf,
  pub configure_flags: Vec<String>,
  pub build_flags: Vec<String>,
  pub install_flags: Vec<String>,
  /// Artifact (relative to the output root) whose existence marks the
  /// external as installed.
  pub artifact: Option<PathBuf>,
}

impl ExternalTarget {
  pub fn new(name: impl Into<String>, source_dir: impl Into<PathBuf>) -> Self {
    ExternalTarget {
      name: name.into(),
      source_dir: source_dir.into(),
      configure_flags: Vec::new(),
      build_flags: Vec::new(),
      install_flags: Vec::new(),
      artifact: None,
    }
  }
}

/// How install commands acquire the privileges they need.
///
/// Injected rather than hardcoded so the platform-specific escalation
/// command stays out of the scheduling logic.
pub trait Escalation: Send + Sync {
  /// Wrap an invocation so it runs with install privileges.
  fn elevate(&self, invocation: Invocation) -> Invocation;
}

/// No escalation; run the command as-is.
pub struct Direct;

impl Escalation for Direct {
  fn elevate(&self, invocation: Invocation) -> Invocation {
    invocation
  }
}

/// Prefix the command with `sudo`.
pub struct Sudo;

impl Escalation for Sudo {
  fn elevate(&self, invocation: Invocation) -> Invocation {
    let mut elevated = Invocation::new("sudo");
    elevated.arg(invocation.program);
    elevated.args(invocation.args);
    elevated
  }
}

/// Driver for one external target under one configuration.
#[derive(Debug)]
pub struct ExternalBuild {
  target: ExternalTarget,
  build_dir: PathBuf,
  cmake_config: &'static str,
  output_root: PathBuf,
}

impl ExternalBuild {
  pub fn new(target: &ExternalTarget, config: &BuildConfig) -> Self {
    ExternalBuild {
      build_dir: config.cmake_dir().join(&target.name),
      cmake_config: config.build_type.cmake_config(),
      output_root: config.build_dir.clone(),
      target: target.clone(),
    }
  }

  pub fn build_dir(&self) -> &Path {
    &self.build_dir
  }

  /// True once `configure` has produced a CMake cache in the build dir.
  pub fn configured(&self) -> bool {
    self.build_dir.join("CMakeCache.txt").exists()
  }

  /// True when the declared install artifact exists under the output root.
  pub fn installed(&self) -> bool {
    match &self.target.artifact {
      Some(artifact) => self.output_root.join(artifact).exists(),
      None => false,
    }
  }

  pub fn configure_invocation(&self) -> Invocation {
    let mut invocation = Invocation::new("cmake");
    invocation.arg("-S");
    invocation.arg(self.target.source_dir.display().to_string());
    invocation.arg("-B");
    invocation.arg(self.build_dir.display().to_string());
    invocation.args(self.target.configure_flags.iter().cloned());
    invocation
  }

  pub fn build_invocation(&self) -> Invocation {
    let mut invocation = Invocation::new("cmake");
    invocation.arg("--build");
    invocation.arg(self.build_dir.display().to_string());
    invocation.arg("--config");
    invocation.arg(self.cmake_config);
    invocation.args(self.target.build_flags.iter().cloned());
    invocation
  }

  pub fn install_invocation(&self, escalation: &dyn Escalation) -> Invocation {
    let mut invocation = Invocation::new("cmake");
    invocation.arg("--install");
    invocation.arg(self.build_dir.display().to_string());
    invocation.arg("--config");
    invocation.arg(self.cmake_config);
    invocation.args(self.target.install_flags.iter().cloned());
    escalation.elevate(invocation)
  }

  /// Remove the build directory, forcing the next invocation to reconfigure.
  pub fn clean(&self) -> Result<(), BuildError> {
    if self.build_dir.exists() {
      fs::remove_dir_all(&self.build_dir)?;
    }
    Ok(())
  }
}

/// Reset a build directory ahead of `configure`.
///
/// `configure` runs once per clean build directory, so any stale directory
/// is discarded first.
pub fn prepare_build_dir(build_dir: &Path) -> Result<(), BuildError> {
  if build_dir.exists() {
    fs::remove_dir_all(build_dir)?;
  }
  fs::create_dir_all(build_dir)?;
  Ok(())
}
