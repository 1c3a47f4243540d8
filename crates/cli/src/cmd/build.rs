//! Implementation of the `build`, `rebuild`, and `run` commands.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail, ensure};

use forge_lib::config::{Platform, WEB_RUN_HOSTNAME, WEB_RUN_PORT};
use forge_lib::executor::{clean, plan_build};
use forge_lib::paths::Layout;
use forge_lib::target::TargetKind;

/// Build one target: plan against the current artifact tree, then execute
/// whatever came out stale.
pub fn cmd_build(manifest: &Path, name: &str) -> Result<()> {
  let (project, config) = super::load(manifest)?;
  let target = super::lookup(&project, name)?;
  let layout = Layout::new(&config);

  let plan = plan_build(target, &config, &layout)?;
  if plan.is_noop() {
    println!("{name}: up to date");
    return Ok(());
  }

  let report = super::run_plan(&plan, &config)?;
  println!("{name}: {} task(s) executed, {} up to date", report.executed, report.skipped);
  Ok(())
}

/// Discard the target's own objects, then build.
pub fn cmd_rebuild(manifest: &Path, name: &str) -> Result<()> {
  let (project, config) = super::load(manifest)?;
  let target = super::lookup(&project, name)?;
  let layout = Layout::new(&config);
  clean(target, &layout)?;

  let plan = plan_build(target, &config, &layout)?;
  let report = super::run_plan(&plan, &config)?;
  println!("{name}: {} task(s) executed, {} up to date", report.executed, report.skipped);
  Ok(())
}

/// Build the target, then run its binary in the foreground.
///
/// Desktop binaries run directly; web binaries are served through `emrun`
/// so a browser can load the markup wrapper.
pub fn cmd_run(manifest: &Path, name: &str) -> Result<()> {
  let (project, config) = super::load(manifest)?;
  let target = super::lookup(&project, name)?;
  ensure!(
    target.kind == TargetKind::Executable,
    "target `{name}` is not an executable"
  );
  let layout = Layout::new(&config);

  let plan = plan_build(target, &config, &layout)?;
  if !plan.is_noop() {
    super::run_plan(&plan, &config)?;
  }

  let binary = layout
    .binary_path(target)
    .context("executable target produced no binary path")?;

  let status = match config.platform {
    Platform::Desktop => Command::new(&binary)
      .status()
      .with_context(|| format!("failed to start {}", binary.display()))?,
    Platform::Web => Command::new("emrun")
      .arg("--hostname")
      .arg(WEB_RUN_HOSTNAME)
      .arg("--port")
      .arg(WEB_RUN_PORT)
      .arg(&binary)
      .status()
      .context("failed to start emrun")?,
  };

  if !status.success() {
    bail!("{name} exited with {status}");
  }
  Ok(())
}
