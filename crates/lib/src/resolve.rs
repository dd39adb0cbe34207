//! Full resolution pass: descriptors to graph to validated graph to plan.

use tracing::{info, warn};

use crate::error::{ResolveError, ViolationReport};
use crate::graph::ModuleGraph;
use crate::plan::{PlanMode, ResolvedPlan, schedule};
use crate::platform::TargetContext;
use crate::registry::Registry;

/// Resolve every module in `registry` for `context` and schedule a plan.
///
/// Unresolved dependencies, cycles and visibility violations are collected
/// together, so one failed pass reports every configuration error at once.
pub fn resolve(registry: &Registry, context: &TargetContext, mode: PlanMode) -> Result<ResolvedPlan, ResolveError> {
  info!(modules = registry.len(), context = %context, "resolving modules");

  let (graph, unresolved) = ModuleGraph::build_partial(registry, context);

  if !unresolved.is_empty() {
    let mut violations = unresolved;
    violations.extend(graph.violations());
    let report = ViolationReport::new(violations);
    warn!(violations = report.len(), "module graph is invalid");
    return Err(ResolveError::Invalid(report));
  }

  let validated = graph.validate().inspect_err(|report| {
    warn!(violations = report.len(), "module graph is invalid");
  })?;

  Ok(schedule(&validated, mode)?)
}
