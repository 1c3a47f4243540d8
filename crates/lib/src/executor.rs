//! Plan building and task execution.
//!
//! A [`Plan`] is the annotated task DAG for one verb: every node carries its
//! staleness verdict, computed before anything runs. Execution walks the
//! graph in parallel waves under a bounded semaphore, skipping fresh nodes
//! as no-op successes. The first failing node stops dispatch; in-flight
//! nodes finish and their outputs stay on disk, so the next invocation
//! resumes where the fixed build left off.

use std::fs;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::assets;
use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::external::{Escalation, ExternalBuild, ExternalTarget, prepare_build_dir};
use crate::graph::{ExternalStep, Task, TaskGraph, closure_targets, object_closure};
use crate::paths::Layout;
use crate::stale::{Freshness, binary_freshness, object_freshness};
use crate::target::{Target, TargetKind};
use crate::toolchain::{Runner, archive_invocation, compile_invocation, link_invocation};

/// An annotated task DAG ready for execution.
#[derive(Debug)]
pub struct Plan {
  pub graph: TaskGraph,
}

impl Plan {
  /// Tasks that will actually run, in insertion order.
  pub fn pending_tasks(&self) -> Vec<&Task> {
    self
      .graph
      .pending()
      .into_iter()
      .map(|idx| &self.graph.node(idx).task)
      .collect()
  }

  /// True when every node is fresh and no process would be spawned.
  pub fn is_noop(&self) -> bool {
    self.graph.pending().is_empty()
  }
}

/// Outcome of executing a plan.
#[derive(Debug, Default)]
pub struct BuildReport {
  /// Nodes that ran and succeeded.
  pub executed: usize,
  /// Fresh nodes skipped as no-op successes.
  pub skipped: usize,
  /// First failing node (description, error); dispatch stopped there.
  pub failed: Option<(String, BuildError)>,
}

impl BuildReport {
  pub fn is_success(&self) -> bool {
    self.failed.is_none()
  }
}

/// Build the plan for `build <target>`: stale compiles, the link step, and
/// asset copies, wired with must-complete-before edges.
///
/// All configuration errors (path collisions, cyclic links) surface here,
/// before any process is spawned.
pub fn plan_build(target: &Arc<Target>, config: &BuildConfig, layout: &Layout) -> Result<Plan, BuildError> {
  let members = closure_targets(target)?;
  layout.check_injective(&members)?;

  let mut graph = TaskGraph::new();
  let mut compile_nodes = Vec::new();
  let mut claimed = std::collections::HashSet::new();
  let mut objects_pending = false;

  // One compile node per closure object; the first target listing a source
  // owns its flags.
  for member in &members {
    for source in &member.sources {
      let object = layout.object_path(source);
      if !claimed.insert(object.clone()) {
        continue;
      }
      let dep_file = layout.dep_file_path(source);
      let freshness = object_freshness(&object, source, &dep_file);
      objects_pending |= freshness.needs_work();
      let invocation = compile_invocation(config, layout, member, source);
      let idx = graph.add(
        Task::Compile {
          target: member.name.clone(),
          source: source.clone(),
          object,
          dep_file,
          invocation,
        },
        freshness,
      );
      compile_nodes.push(idx);
    }
  }

  if let Some(binary) = layout.binary_path(target) {
    let objects = object_closure(target, layout)?;
    let freshness = binary_freshness(&binary, &objects, objects_pending);
    let invocation = match target.kind {
      TargetKind::Executable => link_invocation(config, target, &objects, &binary),
      TargetKind::StaticLibrary => archive_invocation(config, &objects, &binary),
      TargetKind::Objects => unreachable!("objects targets have no binary"),
    };
    let link_idx = graph.add(
      Task::Link {
        target: target.name.clone(),
        binary,
        invocation,
      },
      freshness,
    );
    for &compile_idx in &compile_nodes {
      graph.depend(compile_idx, link_idx);
    }
  }

  for asset in &target.assets {
    let destination = asset.destination_in(layout.bin_dir());
    let freshness = assets::asset_freshness(&asset.source, &destination);
    graph.add(
      Task::CopyAsset {
        target: target.name.clone(),
        source: asset.source.clone(),
        destination,
      },
      freshness,
    );
  }

  Ok(Plan { graph })
}

/// Build the plan for `install <external>`: configure, build, install, in
/// strict order.
///
/// With the declared artifact present the whole chain is fresh; otherwise
/// `build` and `install` always run (the foreign build is idempotent) and
/// `configure` runs only when no CMake cache exists yet.
pub fn plan_external_install(
  external: &ExternalTarget,
  config: &BuildConfig,
  escalation: &dyn Escalation,
) -> Plan {
  let build = ExternalBuild::new(external, config);
  let installed = build.installed();
  let mut graph = TaskGraph::new();

  let configure_freshness = if installed || build.configured() {
    Freshness::Fresh
  } else {
    Freshness::Missing
  };
  let configure_idx = graph.add(
    Task::External {
      name: external.name.clone(),
      step: ExternalStep::Configure,
      build_dir: build.build_dir().to_path_buf(),
      invocation: build.configure_invocation(),
    },
    configure_freshness,
  );

  let step_freshness = if installed { Freshness::Fresh } else { Freshness::Stale };
  let build_idx = graph.add(
    Task::External {
      name: external.name.clone(),
      step: ExternalStep::Build,
      build_dir: build.build_dir().to_path_buf(),
      invocation: build.build_invocation(),
    },
    step_freshness,
  );
  graph.depend(configure_idx, build_idx);

  let install_idx = graph.add(
    Task::External {
      name: external.name.clone(),
      step: ExternalStep::Install,
      build_dir: build.build_dir().to_path_buf(),
      invocation: build.install_invocation(escalation),
    },
    step_freshness,
  );
  graph.depend(build_idx, install_idx);

  Plan { graph }
}

/// Execute a plan's stale nodes wave by wave.
///
/// Independent nodes within a wave run in parallel, bounded by
/// `parallelism`. After the first failure no further wave is dispatched;
/// nodes already running finish and keep their outputs.
pub async fn execute(plan: &Plan, runner: Arc<dyn Runner>, parallelism: usize) -> Result<BuildReport, BuildError> {
  let waves = plan.graph.waves()?;
  let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
  let mut report = BuildReport::default();

  info!(
    nodes = plan.graph.len(),
    pending = plan.graph.pending().len(),
    waves = waves.len(),
    "executing plan"
  );

  'waves: for (wave_idx, wave) in waves.iter().enumerate() {
    let mut ready = Vec::new();
    for &idx in wave {
      let node = plan.graph.node(idx);
      if node.freshness.needs_work() {
        ready.push(node.task.clone());
      } else {
        debug!(task = %node.task.describe(), "fresh, skipping");
        report.skipped += 1;
      }
    }

    if ready.is_empty() {
      continue;
    }
    debug!(wave = wave_idx, tasks = ready.len(), "dispatching wave");

    let mut join_set = JoinSet::new();
    for task in ready {
      let runner = runner.clone();
      let semaphore = semaphore.clone();
      join_set.spawn(async move {
        let _permit = semaphore.acquire().await.unwrap();
        let description = task.describe();
        let result = run_task(task, runner).await;
        (description, result)
      });
    }

    while let Some(joined) = join_set.join_next().await {
      match joined {
        Ok((_, Ok(()))) => {
          report.executed += 1;
        }
        Ok((description, Err(err))) => {
          error!(task = %description, error = %err, "task failed");
          if report.failed.is_none() {
            report.failed = Some((description, err));
          }
        }
        Err(join_err) => {
          error!(error = %join_err, "task panicked");
          if report.failed.is_none() {
            report.failed = Some(("scheduled task".to_string(), BuildError::TaskPanic(join_err.to_string())));
          }
        }
      }
    }

    if report.failed.is_some() {
      break 'waves;
    }
  }

  info!(
    executed = report.executed,
    skipped = report.skipped,
    failed = report.failed.is_some(),
    "plan execution complete"
  );
  Ok(report)
}

async fn run_task(task: Task, runner: Arc<dyn Runner>) -> Result<(), BuildError> {
  match task {
    Task::Compile {
      target,
      source,
      object,
      dep_file,
      invocation,
    } => {
      info!(target = %target, source = %source.display(), "compiling");
      if let Some(parent) = object.parent() {
        tokio::fs::create_dir_all(parent).await?;
      }
      if let Some(parent) = dep_file.parent() {
        tokio::fs::create_dir_all(parent).await?;
      }
      runner.run(invocation).await
    }
    Task::Link {
      target,
      binary,
      invocation,
    } => {
      info!(target = %target, binary = %binary.display(), "linking");
      if let Some(parent) = binary.parent() {
        tokio::fs::create_dir_all(parent).await?;
      }
      runner.run(invocation).await
    }
    Task::CopyAsset {
      target,
      source,
      destination,
    } => {
      info!(target = %target, asset = %source.display(), "copying asset");
      assets::copy_asset(&source, &destination)
    }
    Task::External {
      name,
      step,
      build_dir,
      invocation,
    } => {
      info!(external = %name, ?step, "running external step");
      if step == ExternalStep::Configure {
        prepare_build_dir(&build_dir)?;
      }
      runner.run(invocation).await
    }
  }
}

/// Delete a target's own objects and dep files.
pub fn clean(target: &Target, layout: &Layout) -> Result<(), BuildError> {
  for source in &target.sources {
    remove_if_exists(&layout.object_path(source))?;
    remove_if_exists(&layout.dep_file_path(source))?;
  }
  info!(target = %target.name, "cleaned objects");
  Ok(())
}

/// Delete objects across the target's transitive link closure.
pub fn clean_all(target: &Arc<Target>, layout: &Layout) -> Result<(), BuildError> {
  for member in closure_targets(target)? {
    clean(&member, layout)?;
  }
  Ok(())
}

fn remove_if_exists(path: &std::path::Path) -> Result<(), BuildError> {
  if path.exists() {
    fs::remove_file(path)?;
  }
  Ok(())
}
