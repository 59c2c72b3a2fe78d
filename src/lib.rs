//! Orchestrator for dependence-graph extraction and pattern-mining
//! toolchains.
//!
//! `mine` resolves named analysis subjects from cascading JSON config
//! files, dispatches to a subcommand, and supervises the external tools
//! that do the actual work: the `jpdg` extraction tool that serializes a
//! program dependence graph, the slicing/mining engine that finds frequent
//! subgraph patterns in it, and graphviz for rendering the results. The
//! orchestrator owns configuration precedence, process lifecycles, and
//! failure reporting; the graph algorithms live entirely in the external
//! collaborators.

pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod invoke;
pub mod pipeline;
pub mod render;
pub mod slicer;
