//! Implementation of the `modplan graph` command.

use std::path::Path;

use anyhow::Result;

use modplan_lib::graph::ModuleGraph;

use super::invalid_graph;
use crate::load::load_registry;
use crate::output::OutputFormat;
use crate::target::TargetArgs;

/// Print the resolved graph as DOT. Cycles are drawn, not rejected.
pub fn cmd_graph(path: &Path, target: &TargetArgs) -> Result<()> {
  let registry = load_registry(path)?;
  let context = target.context();

  let graph = ModuleGraph::build(&registry, &context).map_err(|report| invalid_graph(report, OutputFormat::Text))?;
  print!("{}", graph.to_dot());
  Ok(())
}
