//! Implementation of the `export` command.

use std::path::Path;

use anyhow::Result;

use forge_lib::export::{render, write_export};

/// Emit a target's resolved compile configuration as JSON, to stdout or a
/// file.
pub fn cmd_export(manifest: &Path, name: &str, output: Option<&Path>) -> Result<()> {
  let (project, config) = super::load(manifest)?;
  let target = super::lookup(&project, name)?;

  match output {
    Some(path) => {
      write_export(target, &config, path)?;
      println!("{name}: exported to {}", path.display());
    }
    None => println!("{}", render(target, &config)),
  }
  Ok(())
}
