//! Shared helpers for unit tests.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;

use crate::error::BuildError;
use crate::toolchain::{Invocation, Runner, RunnerFuture};

/// Runner that records invocations instead of spawning processes.
///
/// With `failing_on`, any invocation whose rendered command contains the
/// needle fails with [`BuildError::ProcessFailed`] instead of being
/// recorded.
pub struct RecordingRunner {
  invocations: Mutex<Vec<Invocation>>,
  fail_matching: Option<String>,
}

impl RecordingRunner {
  pub fn new() -> Self {
    RecordingRunner {
      invocations: Mutex::new(Vec::new()),
      fail_matching: None,
    }
  }

  pub fn failing_on(needle: impl Into<String>) -> Self {
    RecordingRunner {
      invocations: Mutex::new(Vec::new()),
      fail_matching: Some(needle.into()),
    }
  }

  /// Invocations recorded so far, in completion order.
  pub fn invocations(&self) -> Vec<Invocation> {
    self.invocations.lock().unwrap().clone()
  }
}

impl Runner for RecordingRunner {
  fn run(&self, invocation: Invocation) -> RunnerFuture<'_> {
    Box::pin(async move {
      let rendered = invocation.to_string();
      if let Some(needle) = &self.fail_matching {
        if rendered.contains(needle.as_str()) {
          return Err(BuildError::ProcessFailed {
            command: rendered,
            code: Some(1),
          });
        }
      }
      self.invocations.lock().unwrap().push(invocation);
      Ok(())
    })
  }
}

/// Create an empty file, creating parent directories as needed.
pub fn touch(path: &Path) {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, b"").unwrap();
}

/// Set a file's modification time.
pub fn set_mtime(path: &Path, time: SystemTime) {
  let file: File = OpenOptions::new().write(true).open(path).unwrap();
  file.set_modified(time).unwrap();
}
