//! Per-invocation build configuration.
//!
//! All knobs (platform, build type, output root, toolchain) are read once at
//! startup into an immutable [`BuildConfig`] that is passed explicitly into
//! every component. Nothing in the engine consults the environment after
//! construction.

use std::env;
use std::path::PathBuf;

use crate::error::BuildError;

/// Hostname the web runtime host binds when running a browser-hosted binary.
pub const WEB_RUN_HOSTNAME: &str = "0.0.0.0";

/// Port for the web runtime host.
pub const WEB_RUN_PORT: &str = "8000";

/// Platform the artifacts are produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
  /// Native desktop binaries.
  Desktop,
  /// Browser-hosted runtime; executables get a markup-wrapped binary.
  Web,
}

impl Platform {
  pub fn as_str(&self) -> &'static str {
    match self {
      Platform::Desktop => "desktop",
      Platform::Web => "web",
    }
  }
}

/// Build type; selects which manifest-declared flag set applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildType {
  Release,
  Debug,
}

impl BuildType {
  pub fn as_str(&self) -> &'static str {
    match self {
      BuildType::Release => "release",
      BuildType::Debug => "debug",
    }
  }

  /// CMake-style configuration name for external builds.
  pub fn cmake_config(&self) -> &'static str {
    match self {
      BuildType::Release => "Release",
      BuildType::Debug => "Debug",
    }
  }
}

/// Compiler, linker, and archiver programs for the selected platform.
#[derive(Debug, Clone)]
pub struct Toolchain {
  pub c_compiler: String,
  pub cxx_compiler: String,
  pub linker: String,
  pub archiver: String,
}

impl Toolchain {
  /// Default programs for a platform.
  pub fn for_platform(platform: Platform) -> Self {
    match platform {
      Platform::Desktop => Toolchain {
        c_compiler: "clang".to_string(),
        cxx_compiler: "clang++".to_string(),
        linker: "clang++".to_string(),
        archiver: "ar".to_string(),
      },
      Platform::Web => Toolchain {
        c_compiler: "emcc".to_string(),
        cxx_compiler: "emcc".to_string(),
        linker: "emcc".to_string(),
        archiver: "emar".to_string(),
      },
    }
  }
}

/// Immutable per-invocation configuration.
#[derive(Debug, Clone)]
pub struct BuildConfig {
  pub platform: Platform,
  pub build_type: BuildType,
  /// Output root; the object/dep/bin/lib trees live under it.
  pub build_dir: PathBuf,
  pub toolchain: Toolchain,
  /// Upper bound on concurrently running compile processes.
  pub parallelism: usize,
}

impl BuildConfig {
  /// Configuration with default toolchain and parallelism.
  pub fn new(platform: Platform, build_type: BuildType, build_dir: PathBuf) -> Self {
    BuildConfig {
      platform,
      build_type,
      build_dir,
      toolchain: Toolchain::for_platform(platform),
      parallelism: default_parallelism(),
    }
  }

  /// Read the configuration from the environment.
  ///
  /// Recognized variables: `FORGE_PLATFORM` (`desktop`|`web`),
  /// `FORGE_BUILD_TYPE` (`release`|`debug`), `FORGE_BUILD_DIR` (output root
  /// override), and `FORGE_CC`/`FORGE_CXX`/`FORGE_LINKER`/`FORGE_AR`
  /// (toolchain program overrides).
  pub fn from_env() -> Result<Self, BuildError> {
    let platform = match env::var("FORGE_PLATFORM").map(|v| v.to_lowercase()) {
      Err(_) => Platform::Desktop,
      Ok(v) if v == "desktop" => Platform::Desktop,
      Ok(v) if v == "web" => Platform::Web,
      Ok(other) => {
        return Err(BuildError::Configuration(format!(
          "unexpected FORGE_PLATFORM: {other}"
        )));
      }
    };

    let build_type = match env::var("FORGE_BUILD_TYPE").map(|v| v.to_lowercase()) {
      Err(_) => BuildType::Release,
      Ok(v) if v == "release" => BuildType::Release,
      Ok(v) if v == "debug" => BuildType::Debug,
      Ok(other) => {
        return Err(BuildError::Configuration(format!(
          "unexpected FORGE_BUILD_TYPE: {other}"
        )));
      }
    };

    let build_dir = env::var("FORGE_BUILD_DIR")
      .map(PathBuf::from)
      .unwrap_or_else(|_| {
        PathBuf::from(format!("build-{}-{}", platform.as_str(), build_type.as_str()))
      });

    let mut config = Self::new(platform, build_type, build_dir);
    if let Ok(cc) = env::var("FORGE_CC") {
      config.toolchain.c_compiler = cc;
    }
    if let Ok(cxx) = env::var("FORGE_CXX") {
      config.toolchain.cxx_compiler = cxx;
    }
    if let Ok(linker) = env::var("FORGE_LINKER") {
      config.toolchain.linker = linker;
    }
    if let Ok(ar) = env::var("FORGE_AR") {
      config.toolchain.archiver = ar;
    }
    Ok(config)
  }

  pub fn obj_dir(&self) -> PathBuf {
    self.build_dir.join("obj")
  }

  pub fn dep_dir(&self) -> PathBuf {
    self.build_dir.join("dep")
  }

  pub fn bin_dir(&self) -> PathBuf {
    self.build_dir.join("bin")
  }

  pub fn lib_dir(&self) -> PathBuf {
    self.build_dir.join("lib")
  }

  /// Root for external (CMake-style) build directories.
  pub fn cmake_dir(&self) -> PathBuf {
    self.build_dir.join("cmake")
  }
}

fn default_parallelism() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
