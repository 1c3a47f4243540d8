//! Incremental build orchestration for native C and C++ projects.
//!
//! The engine is organised as a pipeline: a declarative manifest resolves
//! into a [`target::Project`] of shared target handles; the link closure and
//! staleness checks turn one target into an annotated task DAG
//! ([`executor::Plan`]); and the executor walks that DAG in parallel waves,
//! dispatching compiler, archiver, linker, and foreign-build processes
//! through a [`toolchain::Runner`].

pub mod assets;
pub mod config;
pub mod error;
pub mod executor;
pub mod export;
pub mod external;
pub mod graph;
pub mod manifest;
pub mod paths;
pub mod stale;
pub mod target;
pub mod toolchain;

#[cfg(test)]
pub mod testutil;
