//! Implementation of the `install` command for external targets.

use std::path::Path;

use anyhow::{Result, bail};

use forge_lib::executor::plan_external_install;
use forge_lib::external::{Direct, Escalation, Sudo};

/// Configure, build, and install an external target.
///
/// The install step runs under `sudo` on Unix unless `--no-sudo` is given;
/// elsewhere it always runs directly.
pub fn cmd_install(manifest: &Path, name: &str, no_sudo: bool) -> Result<()> {
  let (project, config) = super::load(manifest)?;

  let Some(external) = project.external(name) else {
    if project.target(name).is_some() {
      bail!("`{name}` is a regular target; use `forge build {name}`");
    }
    bail!("unknown external target `{name}`");
  };

  let escalation: Box<dyn Escalation> = if cfg!(unix) && !no_sudo {
    Box::new(Sudo)
  } else {
    Box::new(Direct)
  };

  let plan = plan_external_install(external, &config, escalation.as_ref());
  if plan.is_noop() {
    println!("{name}: already installed");
    return Ok(());
  }

  let report = super::run_plan(&plan, &config)?;
  println!("{name}: installed ({} step(s) executed)", report.executed);
  Ok(())
}
