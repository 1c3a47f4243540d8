//! Staleness engine: decides which artifacts must be regenerated.
//!
//! Classic incremental-build semantics: modification-time comparison of an
//! artifact against its direct source, augmented with the compiler-emitted
//! dependency file (`-MD -MF`) so that edits to a transitively-included
//! header invalidate every translation unit that included it. The engine
//! never parses includes itself.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Whether an artifact must be regenerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
  /// The output file does not exist.
  Missing,
  /// The output exists but an input is newer (or the dep file is gone).
  Stale,
  /// Nothing to do.
  Fresh,
}

impl Freshness {
  pub fn needs_work(&self) -> bool {
    !matches!(self, Freshness::Fresh)
  }
}

fn mtime(path: &Path) -> Option<SystemTime> {
  fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Freshness of one object file.
///
/// `Stale` when the source is newer than the object, any header recorded in
/// the dep file is newer (or vanished), or the dep file itself is missing;
/// the rebuild regenerates the dep file as a side artifact.
pub fn object_freshness(object: &Path, source: &Path, dep_file: &Path) -> Freshness {
  let Some(object_time) = mtime(object) else {
    return Freshness::Missing;
  };
  if mtime(source).is_none_or(|t| t > object_time) {
    return Freshness::Stale;
  }
  let Ok(contents) = fs::read_to_string(dep_file) else {
    return Freshness::Stale;
  };
  for header in parse_dep_file(&contents) {
    if mtime(&header).is_none_or(|t| t > object_time) {
      return Freshness::Stale;
    }
  }
  Freshness::Fresh
}

/// Freshness of a linked artifact against its object closure.
///
/// `objects_pending` is true when any closure object will itself be
/// (re)compiled this session, which forces a relink regardless of mtimes.
pub fn binary_freshness(binary: &Path, objects: &[PathBuf], objects_pending: bool) -> Freshness {
  let Some(binary_time) = mtime(binary) else {
    return Freshness::Missing;
  };
  if objects_pending {
    return Freshness::Stale;
  }
  for object in objects {
    if mtime(object).is_none_or(|t| t > binary_time) {
      return Freshness::Stale;
    }
  }
  Freshness::Fresh
}

/// Parse a Makefile-format dependency file into its prerequisite paths.
///
/// Handles `\`-newline continuations and `\ `-escaped spaces; the rule
/// target (the token ending in `:`) is skipped.
pub fn parse_dep_file(contents: &str) -> Vec<PathBuf> {
  let mut deps = Vec::new();
  let mut token = String::new();

  let flush = |token: &mut String, deps: &mut Vec<PathBuf>| {
    // Tokens ending in `:` are rule targets (`obj.o:` on the first line).
    if !token.is_empty() && !token.ends_with(':') {
      deps.push(PathBuf::from(token.as_str()));
    }
    token.clear();
  };

  let mut chars = contents.chars().peekable();
  while let Some(c) = chars.next() {
    match c {
      '\\' => match chars.peek() {
        Some('\n') => {
          chars.next();
        }
        Some('\r') => {
          chars.next();
          if chars.peek() == Some(&'\n') {
            chars.next();
          }
        }
        Some(' ') => {
          token.push(' ');
          chars.next();
        }
        _ => token.push('\\'),
      },
      c if c.is_whitespace() => flush(&mut token, &mut deps),
      c => token.push(c),
    }
  }
  flush(&mut token, &mut deps);
  deps
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::{set_mtime, touch};
  use std::time::Duration;
  use tempfile::TempDir;

  #[test]
  fn parse_simple_rule() {
    let deps = parse_dep_file("obj/main.o: src/main.cpp src/app.h\n");
    assert_eq!(
      deps,
      vec![PathBuf::from("src/main.cpp"), PathBuf::from("src/app.h")]
    );
  }

  #[test]
  fn parse_line_continuations() {
    let deps = parse_dep_file("obj/main.o: src/main.cpp \\\n  src/app.h \\\n  src/core.h\n");
    assert_eq!(deps.len(), 3);
    assert_eq!(deps[2], PathBuf::from("src/core.h"));
  }

  #[test]
  fn parse_escaped_spaces() {
    let deps = parse_dep_file("obj/main.o: src/my\\ header.h\n");
    assert_eq!(deps, vec![PathBuf::from("src/my header.h")]);
  }

  #[test]
  fn parse_empty_input() {
    assert!(parse_dep_file("").is_empty());
  }

  #[test]
  fn missing_object_is_missing() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("main.cpp");
    touch(&source);
    let state = object_freshness(&dir.path().join("main.o"), &source, &dir.path().join("main.d"));
    assert_eq!(state, Freshness::Missing);
  }

  #[test]
  fn newer_source_makes_object_stale() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("main.cpp");
    let object = dir.path().join("main.o");
    let dep = dir.path().join("main.d");
    touch(&source);
    touch(&object);
    std::fs::write(&dep, "main.o:\n").unwrap();

    let past = SystemTime::now() - Duration::from_secs(60);
    set_mtime(&object, past);

    assert_eq!(object_freshness(&object, &source, &dep), Freshness::Stale);
  }

  #[test]
  fn missing_dep_file_forces_rebuild() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("main.cpp");
    let object = dir.path().join("main.o");
    touch(&source);
    touch(&object);
    let past = SystemTime::now() - Duration::from_secs(60);
    set_mtime(&source, past);

    let state = object_freshness(&object, &source, &dir.path().join("main.d"));
    assert_eq!(state, Freshness::Stale);
  }

  #[test]
  fn newer_recorded_header_makes_object_stale() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("main.cpp");
    let object = dir.path().join("main.o");
    let dep = dir.path().join("main.d");
    let header = dir.path().join("app.h");
    touch(&source);
    touch(&object);
    touch(&header);
    std::fs::write(&dep, format!("main.o: main.cpp {}\n", header.display())).unwrap();

    let past = SystemTime::now() - Duration::from_secs(60);
    set_mtime(&source, past);
    set_mtime(&object, past + Duration::from_secs(30));

    // Header mtime is "now", newer than the object.
    assert_eq!(object_freshness(&object, &source, &dep), Freshness::Stale);
  }

  #[test]
  fn untouched_object_is_fresh() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("main.cpp");
    let object = dir.path().join("main.o");
    let dep = dir.path().join("main.d");
    touch(&source);
    touch(&object);
    std::fs::write(&dep, "main.o:\n").unwrap();

    let past = SystemTime::now() - Duration::from_secs(60);
    set_mtime(&source, past);

    assert_eq!(object_freshness(&object, &source, &dep), Freshness::Fresh);
  }

  #[test]
  fn binary_missing_and_pending_objects() {
    let dir = TempDir::new().unwrap();
    let binary = dir.path().join("app");
    assert_eq!(binary_freshness(&binary, &[], false), Freshness::Missing);

    touch(&binary);
    assert_eq!(binary_freshness(&binary, &[], true), Freshness::Stale);
    assert_eq!(binary_freshness(&binary, &[], false), Freshness::Fresh);
  }

  #[test]
  fn binary_older_than_object_is_stale() {
    let dir = TempDir::new().unwrap();
    let binary = dir.path().join("app");
    let object = dir.path().join("main.o");
    touch(&binary);
    touch(&object);

    let past = SystemTime::now() - Duration::from_secs(60);
    set_mtime(&binary, past);

    assert_eq!(
      binary_freshness(&binary, &[object], false),
      Freshness::Stale
    );
  }
}
