//! Command implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use forge_lib::config::BuildConfig;
use forge_lib::executor::{BuildReport, Plan, execute};
use forge_lib::manifest::load_project;
use forge_lib::target::{Project, Target};
use forge_lib::toolchain::SystemRunner;

pub mod build;
pub mod clean;
pub mod export;
pub mod flags;
pub mod install;

/// Read the environment configuration and load the manifest.
fn load(manifest: &Path) -> Result<(Project, BuildConfig)> {
  let config = BuildConfig::from_env()?;
  let project =
    load_project(manifest, &config).with_context(|| format!("failed to load {}", manifest.display()))?;
  Ok((project, config))
}

fn lookup<'p>(project: &'p Project, name: &str) -> Result<&'p Arc<Target>> {
  match project.target(name) {
    Some(target) => Ok(target),
    None => bail!("unknown target `{name}`"),
  }
}

/// Execute a plan against the real system and fail on the first broken task.
fn run_plan(plan: &Plan, config: &BuildConfig) -> Result<BuildReport> {
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(execute(plan, Arc::new(SystemRunner), config.parallelism))?;
  if let Some((description, error)) = &report.failed {
    bail!("{description}: {error}");
  }
  Ok(report)
}
