//! Implementation of the `flags` diagnostic command.

use std::path::Path;

use anyhow::Result;

use forge_lib::paths::Layout;
use forge_lib::toolchain::compile_invocation;

/// Print the exact compile command a source would get under a target's
/// flags, without running anything.
///
/// The source does not have to be listed by the target; the verb answers
/// "how would this file be compiled here", with the compiler picked from
/// the extension.
pub fn cmd_flags(manifest: &Path, name: &str, source: &Path) -> Result<()> {
  let (project, config) = super::load(manifest)?;
  let target = super::lookup(&project, name)?;

  let layout = Layout::new(&config);
  println!("{}", compile_invocation(&config, &layout, target, source));
  Ok(())
}
