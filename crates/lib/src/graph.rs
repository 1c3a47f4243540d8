//! Link-closure computation and the executable task graph.
//!
//! Two layers live here. The *link closure* walks a target's
//! `link_libraries` references and produces the ordered, duplicate-free set
//! of objects (and targets) feeding its linked artifact, rejecting cycles.
//! The [`TaskGraph`] is the explicit DAG the scheduler executes: each node
//! carries one task and its staleness verdict, each edge a
//! must-complete-before constraint, and Kahn levels give the parallel
//! execution waves.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::BuildError;
use crate::paths::Layout;
use crate::stale::Freshness;
use crate::target::Target;
use crate::toolchain::Invocation;

/// Targets reachable through `link_libraries`, the target itself first,
/// depth first in declaration order, first occurrence winning.
pub fn closure_targets(target: &Arc<Target>) -> Result<Vec<Arc<Target>>, BuildError> {
  let mut members = Vec::new();
  let mut done: HashSet<String> = HashSet::new();
  let mut visiting: Vec<String> = Vec::new();
  visit_target(target, &mut members, &mut done, &mut visiting)?;
  Ok(members)
}

fn visit_target(
  target: &Arc<Target>,
  members: &mut Vec<Arc<Target>>,
  done: &mut HashSet<String>,
  visiting: &mut Vec<String>,
) -> Result<(), BuildError> {
  if let Some(pos) = visiting.iter().position(|name| name == &target.name) {
    let mut cycle: Vec<String> = visiting[pos..].to_vec();
    cycle.push(target.name.clone());
    return Err(BuildError::CyclicDependency { cycle });
  }
  if done.contains(&target.name) {
    return Ok(());
  }

  visiting.push(target.name.clone());
  members.push(target.clone());
  for library in &target.link_libraries {
    visit_target(library, members, done, visiting)?;
  }
  visiting.pop();
  done.insert(target.name.clone());
  Ok(())
}

/// The full set of objects to link for a target: its own objects followed by
/// each linked library's closure, in declaration order, duplicates removed
/// with the first occurrence keeping its position.
///
/// Order is load bearing: some linkers resolve symbols left to right, so the
/// engine never re-sorts.
pub fn object_closure(target: &Arc<Target>, layout: &Layout) -> Result<Vec<PathBuf>, BuildError> {
  let members = closure_targets(target)?;
  let mut objects = Vec::new();
  let mut seen: HashSet<PathBuf> = HashSet::new();
  for member in &members {
    for source in &member.sources {
      let object = layout.object_path(source);
      if seen.insert(object.clone()) {
        objects.push(object);
      }
    }
  }
  Ok(objects)
}

/// Step of the external (foreign build) protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalStep {
  Configure,
  Build,
  Install,
}

/// One schedulable unit of work. Each executed task invokes exactly one
/// external process (asset copies are in-process file operations).
#[derive(Debug, Clone)]
pub enum Task {
  /// Compile one source into its object, emitting the dep file.
  Compile {
    target: String,
    source: PathBuf,
    object: PathBuf,
    dep_file: PathBuf,
    invocation: Invocation,
  },
  /// Link or archive a target's object closure into its artifact.
  Link {
    target: String,
    binary: PathBuf,
    invocation: Invocation,
  },
  /// Copy one declared runtime asset into the binary directory.
  CopyAsset {
    target: String,
    source: PathBuf,
    destination: PathBuf,
  },
  /// One step of a foreign build's configure/build/install protocol.
  External {
    name: String,
    step: ExternalStep,
    build_dir: PathBuf,
    invocation: Invocation,
  },
}

impl Task {
  /// Short identity used in logs and failure reports.
  pub fn describe(&self) -> String {
    match self {
      Task::Compile { target, source, .. } => {
        format!("{target}: compile {}", source.display())
      }
      Task::Link { target, binary, .. } => format!("{target}: link {}", binary.display()),
      Task::CopyAsset { target, source, .. } => {
        format!("{target}: copy asset {}", source.display())
      }
      Task::External { name, step, .. } => {
        let step = match step {
          ExternalStep::Configure => "configure",
          ExternalStep::Build => "build",
          ExternalStep::Install => "install",
        };
        format!("{name}: {step}")
      }
    }
  }
}

/// A task plus its staleness verdict, computed when the plan is built.
#[derive(Debug, Clone)]
pub struct TaskNode {
  pub task: Task,
  pub freshness: Freshness,
}

/// The executable task DAG.
///
/// Edges run from prerequisite to dependent; a node is never dispatched
/// before all of its incoming edges' sources have completed.
#[derive(Debug, Default)]
pub struct TaskGraph {
  graph: DiGraph<TaskNode, ()>,
}

impl TaskGraph {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&mut self, task: Task, freshness: Freshness) -> NodeIndex {
    self.graph.add_node(TaskNode { task, freshness })
  }

  /// Record that `before` must complete before `after` starts.
  pub fn depend(&mut self, before: NodeIndex, after: NodeIndex) {
    self.graph.add_edge(before, after, ());
  }

  pub fn node(&self, index: NodeIndex) -> &TaskNode {
    &self.graph[index]
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }

  /// Nodes whose staleness verdict requires work, in insertion order.
  pub fn pending(&self) -> Vec<NodeIndex> {
    self
      .graph
      .node_indices()
      .filter(|&idx| self.graph[idx].freshness.needs_work())
      .collect()
  }

  /// Parallel execution waves (Kahn levels).
  ///
  /// Each wave contains nodes whose prerequisites all sit in earlier waves;
  /// nodes within one wave are mutually unordered.
  pub fn waves(&self) -> Result<Vec<Vec<NodeIndex>>, BuildError> {
    let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
    let mut node_level: HashMap<NodeIndex, usize> = HashMap::new();

    for idx in self.graph.node_indices() {
      in_degree.insert(idx, self.graph.neighbors_directed(idx, Direction::Incoming).count());
    }

    let mut current_level = 0;
    let mut remaining: HashSet<NodeIndex> = self.graph.node_indices().collect();

    while !remaining.is_empty() {
      let ready: Vec<NodeIndex> = remaining.iter().filter(|&&idx| in_degree[&idx] == 0).copied().collect();

      if ready.is_empty() {
        // Cannot happen for plans built by this crate; defends against
        // hand-assembled graphs.
        return Err(BuildError::Configuration("task graph contains a cycle".to_string()));
      }

      for &idx in &ready {
        node_level.insert(idx, current_level);
        remaining.remove(&idx);
        for neighbor in self.graph.neighbors_directed(idx, Direction::Outgoing) {
          if let Some(degree) = in_degree.get_mut(&neighbor) {
            *degree = degree.saturating_sub(1);
          }
        }
      }

      current_level += 1;
    }

    let max_level = node_level.values().copied().max().unwrap_or(0);
    let mut waves: Vec<Vec<NodeIndex>> = vec![Vec::new(); max_level + 1];
    for idx in self.graph.node_indices() {
      if let Some(&level) = node_level.get(&idx) {
        waves[level].push(idx);
      }
    }
    waves.retain(|wave| !wave.is_empty());
    Ok(waves)
  }
}
