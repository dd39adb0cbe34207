//! Build plan scheduling.
//!
//! A layered variant of Kahn's algorithm: every round collects all modules
//! whose dependencies are already scheduled into one stage. Both public and
//! private edges order work; only public edges propagate include paths to
//! consumers.

mod types;

pub use types::*;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::descriptor::Visibility;
use crate::error::PlanError;
use crate::graph::ValidatedGraph;

/// Per-module state carried from earlier stages to later ones.
struct Finalized<'r> {
  exported_includes: BTreeSet<String>,
  link_dependencies: BTreeSet<&'r str>,
}

/// Schedule a validated graph into stages and compute each module's
/// effective compile environment.
///
/// Within a stage modules are ordered by name, so the same registry and
/// context always produce the same plan.
///
/// # Errors
///
/// - `EmptyGraph` if the graph has no modules and `mode` is `RequireNonEmpty`
/// - `InvariantViolation` if scheduling stalls, which validation rules out
pub fn schedule(graph: &ValidatedGraph<'_>, mode: PlanMode) -> Result<ResolvedPlan, PlanError> {
  if graph.is_empty() {
    return match mode {
      PlanMode::AllowEmpty => {
        debug!("no modules to schedule, returning empty plan");
        Ok(ResolvedPlan::default())
      }
      PlanMode::RequireNonEmpty => Err(PlanError::EmptyGraph),
    };
  }

  // Number of unscheduled dependencies per module
  let mut pending: BTreeMap<&str, usize> = graph
    .names()
    .map(|name| (name, graph.dependencies(name).len()))
    .collect();

  let mut finalized: BTreeMap<&str, Finalized<'_>> = BTreeMap::new();
  let mut plan = ResolvedPlan::default();
  let mut stage_index = 0;

  // `pending` is ordered by name, so the first wave is sorted
  let mut ready: Vec<&str> = pending.iter().filter(|(_, count)| **count == 0).map(|(name, _)| *name).collect();

  while !ready.is_empty() {
    for &name in &ready {
      let (record, state) = compute_module(graph, name, stage_index, &finalized)?;
      plan.modules.insert(name.to_string(), record);
      finalized.insert(name, state);
    }

    // Release dependents only after the whole stage is formed, so that no
    // two modules in one stage depend on each other
    let mut next = Vec::new();
    for &name in &ready {
      for dependent in graph.dependents(name) {
        if let Some(count) = pending.get_mut(dependent)
          && *count > 0
        {
          *count -= 1;
          if *count == 0 {
            next.push(dependent);
          }
        }
      }
    }
    next.sort_unstable();

    debug!(stage = stage_index, modules = ready.len(), "scheduled stage");
    plan.stages.push_stage(ready.into_iter().map(str::to_string).collect());
    ready = next;
    stage_index += 1;
  }

  if finalized.len() != graph.len() {
    let stalled: Vec<&str> = graph.names().filter(|name| !finalized.contains_key(name)).collect();
    return Err(PlanError::InvariantViolation(format!(
      "no schedulable module among {} remaining ({})",
      stalled.len(),
      stalled.join(", ")
    )));
  }

  info!(
    modules = plan.modules.len(),
    stages = plan.stages.stage_count(),
    "build plan complete"
  );
  Ok(plan)
}

/// Compute one module's record. All its dependencies are in `finalized`.
fn compute_module<'r>(
  graph: &ValidatedGraph<'r>,
  name: &'r str,
  stage: usize,
  finalized: &BTreeMap<&'r str, Finalized<'r>>,
) -> Result<(ModulePlan, Finalized<'r>), PlanError> {
  let module = graph
    .module(name)
    .ok_or_else(|| PlanError::InvariantViolation(format!("module '{}' missing from graph", name)))?;

  let mut includes = BTreeSet::new();
  let mut exported_includes = BTreeSet::new();
  for entry in module.includes() {
    includes.insert(entry.path.clone());
    if entry.visibility.is_public() {
      exported_includes.insert(entry.path.clone());
    }
  }

  let mut public_dependencies = Vec::new();
  let mut private_dependencies = Vec::new();
  let mut link_dependencies = BTreeSet::new();

  for (dependency, visibility) in graph.dependencies(name) {
    let state = finalized.get(dependency).ok_or_else(|| {
      PlanError::InvariantViolation(format!(
        "dependency '{}' of '{}' was not scheduled in an earlier stage",
        dependency, name
      ))
    })?;

    // A dependency's exported includes reach this module's own compilation
    // either way, but only public dependencies pass them on to consumers
    includes.extend(state.exported_includes.iter().cloned());
    match visibility {
      Visibility::Public => {
        exported_includes.extend(state.exported_includes.iter().cloned());
        public_dependencies.push(dependency.to_string());
      }
      Visibility::Private => private_dependencies.push(dependency.to_string()),
    }

    link_dependencies.insert(dependency);
    link_dependencies.extend(state.link_dependencies.iter().copied());
  }

  let record = ModulePlan {
    name: name.to_string(),
    stage,
    includes,
    exported_includes: exported_includes.clone(),
    options: BuildOptions::merge(module.options().iter().copied()),
    public_dependencies,
    private_dependencies,
    link_dependencies: link_dependencies.iter().map(|d| d.to_string()).collect(),
  };

  Ok((
    record,
    Finalized {
      exported_includes,
      link_dependencies,
    },
  ))
}
