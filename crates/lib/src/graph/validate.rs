//! Cycle and visibility validation.
//!
//! Both checks run to completion and every violation is reported in one pass.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Deref;

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use tracing::debug;

use super::ModuleGraph;
use crate::error::{Violation, ViolationReport};

/// A module graph known to be acyclic and visibility-correct.
///
/// Only [`ModuleGraph::validate`] constructs one; the scheduler requires it.
#[derive(Debug, Clone)]
pub struct ValidatedGraph<'r> {
  graph: ModuleGraph<'r>,
}

impl<'r> Deref for ValidatedGraph<'r> {
  type Target = ModuleGraph<'r>;

  fn deref(&self) -> &Self::Target {
    &self.graph
  }
}

impl<'r> ValidatedGraph<'r> {
  pub fn into_inner(self) -> ModuleGraph<'r> {
    self.graph
  }
}

impl<'r> ModuleGraph<'r> {
  /// Check the graph for cycles and visibility violations.
  ///
  /// # Errors
  ///
  /// Returns a report with every cycle and every visibility violation found.
  pub fn validate(self) -> Result<ValidatedGraph<'r>, ViolationReport> {
    let violations = self.violations();
    if violations.is_empty() {
      Ok(ValidatedGraph { graph: self })
    } else {
      Err(ViolationReport::new(violations))
    }
  }

  /// Every cycle and visibility violation in the graph.
  pub fn violations(&self) -> Vec<Violation> {
    let mut violations = self.find_cycles();
    violations.extend(self.check_visibility());
    debug!(violations = violations.len(), "validated module graph");
    violations
  }

  /// One `CyclicDependency` per back edge found by a depth-first walk of
  /// each strongly connected component.
  ///
  /// The walk starts at the smallest module of the component and visits
  /// dependencies in name order. Each reported path follows dependency
  /// direction and is rotated to start at its lexicographically smallest
  /// module.
  pub fn find_cycles(&self) -> Vec<Violation> {
    let mut cycles = Vec::new();

    for component in tarjan_scc(&self.graph) {
      let is_cyclic = component.len() > 1 || self.graph.contains_edge(component[0], component[0]);
      if !is_cyclic {
        continue;
      }

      let members: HashSet<NodeIndex> = component.iter().copied().collect();
      let Some(&start) = component.iter().min_by_key(|&&idx| self.graph[idx]) else {
        continue;
      };

      for cycle in self.cycles_in_component(start, &members) {
        debug!(cycle = ?cycle, "dependency cycle detected");
        cycles.push(Violation::CyclicDependency {
          cycle: cycle.into_iter().map(str::to_string).collect(),
        });
      }
    }

    cycles.sort();
    cycles.dedup();
    cycles
  }

  /// Walk `members` depth-first from `start` with an explicit stack and
  /// collect the cycle closed by every back edge.
  fn cycles_in_component(&self, start: NodeIndex, members: &HashSet<NodeIndex>) -> Vec<Vec<&'r str>> {
    let mut cycles = Vec::new();
    let mut visited = HashSet::from([start]);
    // Position of each node on the current path
    let mut on_path: HashMap<NodeIndex, usize> = HashMap::from([(start, 0)]);
    let mut path = vec![start];
    let mut stack = vec![(self.member_dependencies(start, members), 0usize)];

    while let Some((dependencies, cursor)) = stack.last_mut() {
      let Some(&next) = dependencies.get(*cursor) else {
        stack.pop();
        if let Some(done) = path.pop() {
          on_path.remove(&done);
        }
        continue;
      };
      *cursor += 1;

      if let Some(&position) = on_path.get(&next) {
        cycles.push(self.normalize_cycle(&path[position..]));
      } else if visited.insert(next) {
        on_path.insert(next, path.len());
        path.push(next);
        stack.push((self.member_dependencies(next, members), 0));
      }
    }

    cycles
  }

  /// Dependencies of `idx` inside `members`, sorted by name.
  fn member_dependencies(&self, idx: NodeIndex, members: &HashSet<NodeIndex>) -> Vec<NodeIndex> {
    self
      .sorted_dependencies(idx)
      .into_iter()
      .map(|(dep, _)| dep)
      .filter(|dep| members.contains(dep))
      .collect()
  }

  /// Rotate a cycle so it starts at its smallest module name.
  fn normalize_cycle(&self, cycle: &[NodeIndex]) -> Vec<&'r str> {
    let names: Vec<&'r str> = cycle.iter().map(|&idx| self.graph[idx]).collect();
    let smallest = names
      .iter()
      .enumerate()
      .min_by_key(|&(_, name)| *name)
      .map_or(0, |(position, _)| position);

    names[smallest..].iter().chain(&names[..smallest]).copied().collect()
  }

  /// Modules whose headers `name` may use.
  ///
  /// That is every direct dependency (public or private), plus everything
  /// reachable from those through public edges only. A private dependency
  /// of a dependency is never visible.
  pub fn visible_from(&self, name: &str) -> BTreeSet<&'r str> {
    let mut visible = BTreeSet::new();
    let Some(&origin) = self.nodes.get(name) else {
      return visible;
    };

    let mut stack = Vec::new();
    for (dep, _) in self.sorted_dependencies(origin) {
      if visible.insert(self.graph[dep]) {
        stack.push(dep);
      }
    }

    while let Some(idx) = stack.pop() {
      for (next, visibility) in self.sorted_dependencies(idx) {
        if visibility.is_public() && visible.insert(self.graph[next]) {
          stack.push(next);
        }
      }
    }

    visible
  }

  /// One `VisibilityViolation` per used module that is not visible to its user.
  pub fn check_visibility(&self) -> Vec<Violation> {
    let mut violations = Vec::new();

    for module in self.modules.values() {
      if module.uses().is_empty() {
        continue;
      }

      let visible = self.visible_from(module.name());
      for &used in module.uses() {
        if used != module.name() && !visible.contains(used) {
          violations.push(Violation::VisibilityViolation {
            consumer: module.name().to_string(),
            leaked: used.to_string(),
          });
        }
      }
    }

    violations
  }
}
