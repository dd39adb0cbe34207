//! Error taxonomy for module resolution.
//!
//! Every error here is a configuration-time error, detected before any
//! compilation work is dispatched. None of them are transient.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the descriptor registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
  /// A descriptor with this name is already registered.
  #[error("module '{0}' is already registered")]
  DuplicateModule(String),

  /// No descriptor with this name is registered.
  #[error("unknown module '{0}'")]
  UnknownModule(String),

  /// A descriptor names itself as a dependency.
  #[error("module '{0}' lists itself as a dependency")]
  SelfDependency(String),

  /// A descriptor lists the same module as both public and private dependency.
  #[error("module '{module}' lists '{dependency}' as both a public and a private dependency")]
  ConflictingVisibility { module: String, dependency: String },
}

/// A single problem found while building or validating the module graph.
///
/// Violations are accumulated: one pass reports all of them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
  /// A dependency reference names a module that is not registered.
  #[error("module '{consumer}' depends on unknown module '{missing}'")]
  UnresolvedDependency { consumer: String, missing: String },

  /// Modules depend on each other in a cycle.
  ///
  /// The path follows dependency direction and starts at the
  /// lexicographically smallest module of the cycle.
  #[error("dependency cycle: {}", format_cycle(.cycle))]
  CyclicDependency { cycle: Vec<String> },

  /// A module uses a module that is not visible to it.
  #[error("module '{consumer}' uses '{leaked}', which is neither a dependency nor exposed publicly by one")]
  VisibilityViolation { consumer: String, leaked: String },
}

impl Violation {
  /// Short machine-friendly name of the violation kind.
  pub fn kind(&self) -> &'static str {
    match self {
      Violation::UnresolvedDependency { .. } => "unresolved_dependency",
      Violation::CyclicDependency { .. } => "cyclic_dependency",
      Violation::VisibilityViolation { .. } => "visibility_violation",
    }
  }

  /// Modules involved, for locating the offending descriptors.
  pub fn modules(&self) -> Vec<&str> {
    match self {
      Violation::UnresolvedDependency { consumer, .. } => vec![consumer.as_str()],
      Violation::CyclicDependency { cycle } => cycle.iter().map(String::as_str).collect(),
      Violation::VisibilityViolation { consumer, .. } => vec![consumer.as_str()],
    }
  }
}

fn format_cycle(cycle: &[String]) -> String {
  match cycle.first() {
    Some(first) => format!("{} -> {}", cycle.join(" -> "), first),
    None => String::new(),
  }
}

/// Every violation found in one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViolationReport {
  violations: Vec<Violation>,
}

impl ViolationReport {
  /// Build a report. Violations are sorted and deduplicated so that the
  /// report does not depend on traversal order.
  pub fn new(mut violations: Vec<Violation>) -> Self {
    violations.sort();
    violations.dedup();
    Self { violations }
  }

  pub fn violations(&self) -> &[Violation] {
    &self.violations
  }

  pub fn len(&self) -> usize {
    self.violations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.violations.is_empty()
  }

  /// Cycle paths in the report.
  pub fn cycles(&self) -> impl Iterator<Item = &[String]> {
    self.violations.iter().filter_map(|v| match v {
      Violation::CyclicDependency { cycle } => Some(cycle.as_slice()),
      _ => None,
    })
  }
}

impl fmt::Display for ViolationReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} configuration error(s) in module graph", self.violations.len())?;
    for violation in &self.violations {
      write!(f, "\n  - {}", violation)?;
    }
    Ok(())
  }
}

impl std::error::Error for ViolationReport {}

impl IntoIterator for ViolationReport {
  type Item = Violation;
  type IntoIter = std::vec::IntoIter<Violation>;

  fn into_iter(self) -> Self::IntoIter {
    self.violations.into_iter()
  }
}

/// Errors raised by the build plan scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
  /// The registry is empty and a non-empty plan was required.
  #[error("no modules to plan")]
  EmptyGraph,

  /// The scheduler observed a state validation should have rejected.
  #[error("internal error: scheduler invariant violated: {0}")]
  InvariantViolation(String),
}

/// Errors from a full resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  /// The descriptors do not form a valid module graph.
  #[error("{0}")]
  Invalid(ViolationReport),

  #[error(transparent)]
  Plan(#[from] PlanError),
}

impl From<ViolationReport> for ResolveError {
  fn from(report: ViolationReport) -> Self {
    ResolveError::Invalid(report)
  }
}
