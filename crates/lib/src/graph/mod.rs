//! The module graph: descriptors resolved against one target context.
//!
//! Building the graph evaluates every platform predicate exactly once and
//! turns each surviving dependency reference into a [`DependencyEdge`]. The
//! graph borrows the registry for its whole lifetime, which keeps descriptors
//! immutable for the duration of a resolution pass.

mod validate;

pub use validate::ValidatedGraph;

use std::collections::BTreeMap;

use petgraph::Direction;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use tracing::{debug, trace};

use crate::descriptor::{IncludeEntry, ModuleDescriptor, OptionEntry, Visibility};
use crate::error::{Violation, ViolationReport};
use crate::platform::TargetContext;
use crate::registry::Registry;

/// A resolved dependency: `consumer` depends on `dependency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DependencyEdge<'r> {
  pub consumer: &'r str,
  pub dependency: &'r str,
  pub visibility: Visibility,
}

/// A descriptor with every predicate-guarded entry evaluated.
#[derive(Debug, Clone)]
pub struct ResolvedModule<'r> {
  descriptor: &'r ModuleDescriptor,
  includes: Vec<&'r IncludeEntry>,
  options: Vec<&'r OptionEntry>,
  uses: Vec<&'r str>,
}

impl<'r> ResolvedModule<'r> {
  fn resolve(descriptor: &'r ModuleDescriptor, context: &TargetContext) -> Self {
    let mut uses: Vec<&'r str> = descriptor
      .uses
      .iter()
      .filter(|u| context.matches(u.when.as_ref()))
      .map(|u| u.name.as_str())
      .collect();
    uses.sort_unstable();
    uses.dedup();

    Self {
      descriptor,
      includes: descriptor
        .includes
        .iter()
        .filter(|i| context.matches(i.when.as_ref()))
        .collect(),
      options: descriptor
        .options
        .iter()
        .filter(|o| context.matches(o.when.as_ref()))
        .collect(),
      uses,
    }
  }

  pub fn name(&self) -> &'r str {
    &self.descriptor.name
  }

  pub fn descriptor(&self) -> &'r ModuleDescriptor {
    self.descriptor
  }

  /// Include entries that survived predicate evaluation, in declaration order.
  pub fn includes(&self) -> &[&'r IncludeEntry] {
    &self.includes
  }

  /// Options that survived predicate evaluation, in declaration order.
  pub fn options(&self) -> &[&'r OptionEntry] {
    &self.options
  }

  /// Used modules that survived predicate evaluation, sorted.
  pub fn uses(&self) -> &[&'r str] {
    &self.uses
  }
}

/// Directed graph of modules. Edges point from consumer to dependency.
#[derive(Debug, Clone)]
pub struct ModuleGraph<'r> {
  graph: DiGraph<&'r str, Visibility>,
  nodes: BTreeMap<&'r str, NodeIndex>,
  modules: BTreeMap<&'r str, ResolvedModule<'r>>,
}

impl<'r> ModuleGraph<'r> {
  /// Resolve every descriptor in `registry` against `context`.
  ///
  /// # Errors
  ///
  /// Returns a report listing every dependency reference that names a module
  /// absent from the registry.
  pub fn build(registry: &'r Registry, context: &TargetContext) -> Result<Self, ViolationReport> {
    let (graph, unresolved) = Self::build_partial(registry, context);
    if unresolved.is_empty() {
      Ok(graph)
    } else {
      Err(ViolationReport::new(unresolved))
    }
  }

  /// Build the graph, skipping unresolved references instead of failing.
  ///
  /// Returns the graph of everything that did resolve together with one
  /// `UnresolvedDependency` per dangling reference, so callers can keep
  /// validating and report all problems at once.
  pub fn build_partial(registry: &'r Registry, context: &TargetContext) -> (Self, Vec<Violation>) {
    let mut graph = DiGraph::with_capacity(registry.len(), 0);
    let mut nodes = BTreeMap::new();
    let mut modules = BTreeMap::new();
    let mut unresolved = Vec::new();

    // First pass: one node per module, in name order
    for descriptor in registry.iter() {
      let name = descriptor.name.as_str();
      nodes.insert(name, graph.add_node(name));
    }

    // Second pass: edges for every dependency reference that survives the context
    for descriptor in registry.iter() {
      let consumer = descriptor.name.as_str();
      let consumer_idx = nodes[consumer];

      let references = descriptor
        .public_dependencies
        .iter()
        .map(|d| (d, Visibility::Public))
        .chain(descriptor.private_dependencies.iter().map(|d| (d, Visibility::Private)));

      for (reference, visibility) in references {
        if !context.matches(reference.when.as_ref()) {
          trace!(consumer, dependency = %reference.name, "dependency excluded by predicate");
          continue;
        }

        match nodes.get(reference.name.as_str()) {
          Some(&dependency_idx) => {
            if graph.find_edge(consumer_idx, dependency_idx).is_none() {
              graph.add_edge(consumer_idx, dependency_idx, visibility);
            }
          }
          None => unresolved.push(Violation::UnresolvedDependency {
            consumer: consumer.to_string(),
            missing: reference.name.clone(),
          }),
        }
      }

      modules.insert(consumer, ResolvedModule::resolve(descriptor, context));
    }

    debug!(
      modules = graph.node_count(),
      edges = graph.edge_count(),
      unresolved = unresolved.len(),
      "built module graph"
    );

    (Self { graph, nodes, modules }, unresolved)
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.nodes.contains_key(name)
  }

  pub fn module(&self, name: &str) -> Option<&ResolvedModule<'r>> {
    self.modules.get(name)
  }

  /// Resolved modules in ascending name order.
  pub fn modules(&self) -> impl Iterator<Item = &ResolvedModule<'r>> {
    self.modules.values()
  }

  /// Module names in ascending order.
  pub fn names(&self) -> impl Iterator<Item = &'r str> + '_ {
    self.modules.keys().copied()
  }

  /// Direct dependencies of a module, sorted by name.
  pub fn dependencies(&self, name: &str) -> Vec<(&'r str, Visibility)> {
    let Some(&idx) = self.nodes.get(name) else {
      return Vec::new();
    };
    self
      .sorted_dependencies(idx)
      .into_iter()
      .map(|(dep, visibility)| (self.graph[dep], visibility))
      .collect()
  }

  /// Modules that directly depend on `name`, sorted.
  pub fn dependents(&self, name: &str) -> Vec<&'r str> {
    let Some(&idx) = self.nodes.get(name) else {
      return Vec::new();
    };
    let mut dependents: Vec<&'r str> = self
      .graph
      .neighbors_directed(idx, Direction::Incoming)
      .map(|dependent| self.graph[dependent])
      .collect();
    dependents.sort_unstable();
    dependents
  }

  /// Every edge, sorted by consumer then dependency.
  pub fn edges(&self) -> Vec<DependencyEdge<'r>> {
    let mut edges: Vec<DependencyEdge<'r>> = self
      .graph
      .edge_references()
      .map(|edge| DependencyEdge {
        consumer: self.graph[edge.source()],
        dependency: self.graph[edge.target()],
        visibility: *edge.weight(),
      })
      .collect();
    edges.sort();
    edges
  }

  /// Render the graph in Graphviz DOT. Private edges are dashed.
  pub fn to_dot(&self) -> String {
    format!(
      "{}",
      Dot::with_attr_getters(
        &self.graph,
        &[Config::EdgeNoLabel],
        &|_, edge| match edge.weight() {
          Visibility::Public => String::new(),
          Visibility::Private => "style = dashed".to_string(),
        },
        &|_, _| String::new(),
      )
    )
  }

  /// Outgoing edges of a node, sorted by dependency name.
  fn sorted_dependencies(&self, idx: NodeIndex) -> Vec<(NodeIndex, Visibility)> {
    let mut deps: Vec<(NodeIndex, Visibility)> = self
      .graph
      .edges_directed(idx, Direction::Outgoing)
      .map(|edge| (edge.target(), *edge.weight()))
      .collect();
    deps.sort_unstable_by_key(|(dep, _)| self.graph[*dep]);
    deps
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::descriptor::DependencyRef;
  use crate::platform::arch::Arch;
  use crate::platform::os::Os;
  use crate::platform::Platform;

  fn windows() -> TargetContext {
    TargetContext::for_platform(Platform::new(Arch::X86_64, Os::Windows))
  }

  fn linux() -> TargetContext {
    TargetContext::for_platform(Platform::new(Arch::X86_64, Os::Linux))
  }

  fn registry(descriptors: Vec<ModuleDescriptor>) -> Registry {
    Registry::from_descriptors(descriptors).unwrap()
  }

  #[test]
  fn empty_registry_builds_empty_graph() {
    let registry = Registry::new();
    let graph = ModuleGraph::build(&registry, &linux()).unwrap();
    assert!(graph.is_empty());
    assert_eq!(graph.edge_count(), 0);
  }

  #[test]
  fn edges_carry_declared_visibility() {
    let registry = registry(vec![
      ModuleDescriptor::new("Core"),
      ModuleDescriptor::new("Slate"),
      ModuleDescriptor::new("Editor").public_dep("Core").private_dep("Slate"),
    ]);
    let graph = ModuleGraph::build(&registry, &linux()).unwrap();

    assert_eq!(
      graph.edges(),
      vec![
        DependencyEdge {
          consumer: "Editor",
          dependency: "Core",
          visibility: Visibility::Public,
        },
        DependencyEdge {
          consumer: "Editor",
          dependency: "Slate",
          visibility: Visibility::Private,
        },
      ]
    );
    assert_eq!(graph.dependents("Core"), vec!["Editor"]);
    assert!(graph.dependencies("Core").is_empty());
  }

  #[test]
  fn predicates_filter_dependencies_and_includes() {
    let registry = registry(vec![
      ModuleDescriptor::new("D3D11RHI"),
      ModuleDescriptor::new("Renderer")
        .private_include("Renderer/Private")
        .include_entry(
          "Windows/D3D11RHI/Private",
          Visibility::Private,
          Some("windows".parse().unwrap()),
        )
        .private_dep(DependencyRef::new("D3D11RHI").when("windows".parse().unwrap())),
    ]);

    let on_windows = ModuleGraph::build(&registry, &windows()).unwrap();
    assert_eq!(
      on_windows.dependencies("Renderer"),
      vec![("D3D11RHI", Visibility::Private)]
    );
    assert_eq!(on_windows.module("Renderer").unwrap().includes().len(), 2);

    let on_linux = ModuleGraph::build(&registry, &linux()).unwrap();
    assert!(on_linux.dependencies("Renderer").is_empty());
    assert_eq!(on_linux.module("Renderer").unwrap().includes().len(), 1);
  }

  #[test]
  fn excluded_reference_to_missing_module_is_not_an_error() {
    let registry = registry(vec![
      ModuleDescriptor::new("Game").private_dep(DependencyRef::new("XboxSdk").when("xbox".parse().unwrap())),
    ]);
    assert!(ModuleGraph::build(&registry, &linux()).is_ok());
  }

  #[test]
  fn reports_every_unresolved_dependency() {
    let registry = registry(vec![
      ModuleDescriptor::new("Core"),
      ModuleDescriptor::new("Engine").public_dep("Core").public_dep("RenderCore"),
      ModuleDescriptor::new("Game").public_dep("Engine").private_dep("Physics"),
    ]);

    let report = ModuleGraph::build(&registry, &linux()).unwrap_err();
    assert_eq!(
      report.violations(),
      &[
        Violation::UnresolvedDependency {
          consumer: "Engine".to_string(),
          missing: "RenderCore".to_string(),
        },
        Violation::UnresolvedDependency {
          consumer: "Game".to_string(),
          missing: "Physics".to_string(),
        },
      ]
    );
  }

  #[test]
  fn partial_build_keeps_resolved_edges() {
    let registry = registry(vec![
      ModuleDescriptor::new("Core"),
      ModuleDescriptor::new("Engine").public_dep("Core").public_dep("Missing"),
    ]);

    let (graph, unresolved) = ModuleGraph::build_partial(&registry, &linux());
    assert_eq!(unresolved.len(), 1);
    assert_eq!(graph.dependencies("Engine"), vec![("Core", Visibility::Public)]);
  }

  #[test]
  fn duplicate_references_produce_one_edge() {
    let registry = registry(vec![
      ModuleDescriptor::new("Core"),
      ModuleDescriptor::new("Engine").public_dep("Core").public_dep("Core"),
    ]);
    let graph = ModuleGraph::build(&registry, &linux()).unwrap();
    assert_eq!(graph.edge_count(), 1);
  }

  #[test]
  fn dot_output_marks_private_edges() {
    let registry = registry(vec![
      ModuleDescriptor::new("Core"),
      ModuleDescriptor::new("Slate"),
      ModuleDescriptor::new("Editor").public_dep("Core").private_dep("Slate"),
    ]);
    let dot = ModuleGraph::build(&registry, &linux()).unwrap().to_dot();

    assert!(dot.starts_with("digraph"));
    assert!(dot.contains("label = \"Editor\""));
    assert_eq!(dot.matches("style = dashed").count(), 1);
  }
}
