//! Command assembly and external process execution.
//!
//! Every toolchain step is kept as a structured argument vector
//! ([`Invocation`]); nothing is ever composed into a shell-interpreted
//! string, so flag tokens pass through verbatim with no quoting hazards.

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use tracing::debug;

use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::paths::Layout;
use crate::target::Target;

/// A single external process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: String,
  pub args: Vec<String>,
}

impl Invocation {
  pub fn new(program: impl Into<String>) -> Self {
    Invocation {
      program: program.into(),
      args: Vec::new(),
    }
  }

  pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(&mut self, args: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      write!(f, " {arg}")?;
    }
    Ok(())
  }
}

/// Source language, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
  C,
  Cxx,
}

impl Language {
  /// `.c` is C; every other extension uses the C++ compiler.
  pub fn of(source: &Path) -> Self {
    match source.extension().and_then(|e| e.to_str()) {
      Some("c") => Language::C,
      _ => Language::Cxx,
    }
  }
}

/// Compile command for one source of a target.
///
/// Emits the dependency file (`-MD -MF<dep>`) as a side artifact consumed
/// by the next session's invalidation checks.
pub fn compile_invocation(
  config: &BuildConfig,
  layout: &Layout,
  target: &Target,
  source: &Path,
) -> Invocation {
  let language = Language::of(source);
  let program = match language {
    Language::C => &config.toolchain.c_compiler,
    Language::Cxx => &config.toolchain.cxx_compiler,
  };

  let mut invocation = Invocation::new(program);
  invocation.args(target.compiler_flags.iter().cloned());
  match language {
    Language::C => invocation.args(target.c_flags.iter().cloned()),
    Language::Cxx => invocation.args(target.cxx_flags.iter().cloned()),
  };
  invocation.arg("-c");
  for include in &target.includes {
    invocation.arg(format!("-I{}", include.display()));
  }
  for define in &target.defines {
    invocation.arg(format!("-D{define}"));
  }
  invocation.arg("-MD");
  invocation.arg(format!("-MF{}", layout.dep_file_path(source).display()));
  invocation.arg("-o");
  invocation.arg(layout.object_path(source).display().to_string());
  invocation.arg(source.display().to_string());
  invocation
}

/// Link command producing an executable from the target's object closure.
pub fn link_invocation(
  config: &BuildConfig,
  target: &Target,
  objects: &[std::path::PathBuf],
  binary: &Path,
) -> Invocation {
  let mut invocation = Invocation::new(&config.toolchain.linker);
  invocation.args(target.compiler_flags.iter().cloned());
  for define in &target.defines {
    invocation.arg(format!("-D{define}"));
  }
  invocation.arg("-o");
  invocation.arg(binary.display().to_string());
  for object in objects {
    invocation.arg(object.display().to_string());
  }
  invocation.args(target.linker_flags.iter().cloned());
  invocation
}

/// Archive command producing a static library from the object closure.
pub fn archive_invocation(
  config: &BuildConfig,
  objects: &[std::path::PathBuf],
  library: &Path,
) -> Invocation {
  let mut invocation = Invocation::new(&config.toolchain.archiver);
  invocation.arg("rcs");
  invocation.arg(library.display().to_string());
  for object in objects {
    invocation.arg(object.display().to_string());
  }
  invocation
}

pub type RunnerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), BuildError>> + Send + 'a>>;

/// Seam between the scheduler and the operating system.
///
/// The scheduler never spawns processes itself; it hands each node's
/// invocation to a runner, which lets tests observe exactly what would be
/// dispatched.
pub trait Runner: Send + Sync {
  /// Run one external process to completion.
  fn run(&self, invocation: Invocation) -> RunnerFuture<'_>;
}

/// Runner that spawns real processes.
pub struct SystemRunner;

impl Runner for SystemRunner {
  fn run(&self, invocation: Invocation) -> RunnerFuture<'_> {
    Box::pin(async move {
      debug!(command = %invocation, "spawning process");

      let output = tokio::process::Command::new(&invocation.program)
        .args(&invocation.args)
        .output()
        .await?;

      if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
          debug!(stderr = %stderr, "process stderr");
        }
        return Err(BuildError::ProcessFailed {
          command: invocation.to_string(),
          code: output.status.code(),
        });
      }

      let stdout = String::from_utf8_lossy(&output.stdout);
      if !stdout.trim().is_empty() {
        debug!(stdout = %stdout, "process stdout");
      }
      Ok(())
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{BuildType, Platform};
  use crate::target::TargetKind;
  use std::path::PathBuf;

  fn config() -> BuildConfig {
    BuildConfig::new(Platform::Desktop, BuildType::Release, PathBuf::from("out"))
  }

  fn sample_target() -> Target {
    let mut target = Target::new("app", TargetKind::Executable);
    target.sources.push(PathBuf::from("src/main.cpp"));
    target.sources.push(PathBuf::from("src/util.c"));
    target.includes.push(PathBuf::from("src"));
    target.defines.push("APP_NAME=\"app\"".to_string());
    target.compiler_flags.push("-O2".to_string());
    target.c_flags.push("-std=c11".to_string());
    target.cxx_flags.push("--std=c++20".to_string());
    target.linker_flags.push("-lGL".to_string());
    target
  }

  #[test]
  fn language_selection_by_extension() {
    assert_eq!(Language::of(Path::new("a.c")), Language::C);
    assert_eq!(Language::of(Path::new("a.cpp")), Language::Cxx);
    assert_eq!(Language::of(Path::new("a.cc")), Language::Cxx);
    assert_eq!(Language::of(Path::new("a.cxx")), Language::Cxx);
  }

  #[test]
  fn cxx_compile_invocation_shape() {
    let config = config();
    let layout = Layout::new(&config);
    let target = sample_target();
    let invocation = compile_invocation(&config, &layout, &target, Path::new("src/main.cpp"));

    assert_eq!(invocation.program, "clang++");
    assert!(invocation.args.contains(&"--std=c++20".to_string()));
    assert!(!invocation.args.contains(&"-std=c11".to_string()));
    assert!(invocation.args.contains(&"-Isrc".to_string()));
    assert!(invocation.args.contains(&"-DAPP_NAME=\"app\"".to_string()));
    assert!(invocation.args.contains(&"-MD".to_string()));
    assert!(invocation.args.contains(&"-MFout/dep/src/main.d".to_string()));
    assert_eq!(invocation.args.last().unwrap(), "src/main.cpp");
  }

  #[test]
  fn c_compile_invocation_uses_c_compiler_and_flags() {
    let config = config();
    let layout = Layout::new(&config);
    let target = sample_target();
    let invocation = compile_invocation(&config, &layout, &target, Path::new("src/util.c"));

    assert_eq!(invocation.program, "clang");
    assert!(invocation.args.contains(&"-std=c11".to_string()));
    assert!(!invocation.args.contains(&"--std=c++20".to_string()));
  }

  #[test]
  fn link_invocation_preserves_object_order() {
    let config = config();
    let target = sample_target();
    let objects = vec![PathBuf::from("out/obj/src/main.o"), PathBuf::from("out/obj/src/util.o")];
    let invocation = link_invocation(&config, &target, &objects, Path::new("out/bin/app"));

    assert_eq!(invocation.program, "clang++");
    let main_pos = invocation.args.iter().position(|a| a == "out/obj/src/main.o").unwrap();
    let util_pos = invocation.args.iter().position(|a| a == "out/obj/src/util.o").unwrap();
    assert!(main_pos < util_pos);
    // Linker flags come after the objects.
    let lgl_pos = invocation.args.iter().position(|a| a == "-lGL").unwrap();
    assert!(util_pos < lgl_pos);
  }

  #[test]
  fn archive_invocation_shape() {
    let config = config();
    let objects = vec![PathBuf::from("out/obj/src/core.o")];
    let invocation = archive_invocation(&config, &objects, Path::new("out/lib/libcore.a"));

    assert_eq!(invocation.program, "ar");
    assert_eq!(invocation.args[0], "rcs");
    assert_eq!(invocation.args[1], "out/lib/libcore.a");
  }

  #[test]
  fn invocation_display_renders_argv() {
    let mut invocation = Invocation::new("clang");
    invocation.arg("-c").arg("main.c");
    assert_eq!(invocation.to_string(), "clang -c main.c");
  }
}
