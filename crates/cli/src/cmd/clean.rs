//! Implementation of the `clean` and `clean-all` commands.

use std::path::Path;

use anyhow::{Result, bail};

use forge_lib::executor::{clean, clean_all};
use forge_lib::external::ExternalBuild;
use forge_lib::paths::Layout;

/// Remove one target's own objects and dependency files.
///
/// For an external target this discards its whole build directory instead,
/// forcing the next install to reconfigure.
pub fn cmd_clean(manifest: &Path, name: &str) -> Result<()> {
  let (project, config) = super::load(manifest)?;

  if let Some(target) = project.target(name) {
    let layout = Layout::new(&config);
    clean(target, &layout)?;
  } else if let Some(external) = project.external(name) {
    ExternalBuild::new(external, &config).clean()?;
  } else {
    bail!("unknown target `{name}`");
  }
  println!("{name}: cleaned");
  Ok(())
}

/// Remove objects across the target's whole link closure.
pub fn cmd_clean_all(manifest: &Path, name: &str) -> Result<()> {
  let (project, config) = super::load(manifest)?;
  let target = super::lookup(&project, name)?;
  let layout = Layout::new(&config);
  clean_all(target, &layout)?;
  println!("{name}: cleaned closure");
  Ok(())
}
