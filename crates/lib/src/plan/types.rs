//! Build plan output types.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::descriptor::{OptionEntry, OptionValue, keys};

/// Whether an empty registry is an acceptable input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlanMode {
  /// Zero modules yield an empty plan.
  #[default]
  AllowEmpty,
  /// Zero modules are an error (`EmptyGraph`).
  RequireNonEmpty,
}

/// Ordered stages of module names.
///
/// Modules within a stage have no dependency relationship and may be
/// compiled concurrently. Every dependency of a module sits in a strictly
/// earlier stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildPlan {
  stages: Vec<Vec<String>>,
}

impl BuildPlan {
  pub(crate) fn push_stage(&mut self, stage: Vec<String>) {
    self.stages.push(stage);
  }

  pub fn stages(&self) -> &[Vec<String>] {
    &self.stages
  }

  pub fn stage_count(&self) -> usize {
    self.stages.len()
  }

  pub fn module_count(&self) -> usize {
    self.stages.iter().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.stages.is_empty()
  }

  /// Index of the stage containing `module`.
  pub fn stage_of(&self, module: &str) -> Option<usize> {
    self.stages.iter().position(|stage| stage.iter().any(|m| m == module))
  }

  /// Module names in execution order.
  pub fn modules(&self) -> impl Iterator<Item = &str> {
    self.stages.iter().flatten().map(String::as_str)
  }
}

/// A module's merged build options.
///
/// Options are applied in declaration order; a later value for a key
/// replaces an earlier one. Options never merge across modules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildOptions(BTreeMap<String, OptionValue>);

impl BuildOptions {
  pub(crate) fn merge<'a>(entries: impl IntoIterator<Item = &'a OptionEntry>) -> Self {
    let mut options = BTreeMap::new();
    for entry in entries {
      options.insert(entry.key.clone(), entry.value.clone());
    }
    Self(options)
  }

  pub fn get(&self, key: &str) -> Option<&OptionValue> {
    self.0.get(key)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Minimum number of files before a precompiled header is used.
  pub fn min_files_using_pch(&self) -> Option<i64> {
    self.get(keys::MIN_FILES_USING_PCH).and_then(OptionValue::as_int)
  }

  /// Whether unity batching is turned off. Defaults to `false`.
  pub fn unity_disabled(&self) -> bool {
    self
      .get(keys::UNITY_DISABLED)
      .and_then(OptionValue::as_bool)
      .unwrap_or(false)
  }

  pub fn pch_usage(&self) -> Option<&str> {
    self.get(keys::PCH_USAGE).and_then(OptionValue::as_str)
  }
}

/// Everything the orchestrator needs to compile one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePlan {
  pub name: String,

  /// Index of the stage this module is scheduled in.
  pub stage: usize,

  /// Include paths for this module's own compilation.
  pub includes: BTreeSet<String>,

  /// Include paths this module exposes to its consumers.
  pub exported_includes: BTreeSet<String>,

  pub options: BuildOptions,

  /// Direct public dependencies that survived predicate evaluation.
  pub public_dependencies: Vec<String>,

  /// Direct private dependencies that survived predicate evaluation.
  pub private_dependencies: Vec<String>,

  /// Every module this one transitively depends on, regardless of visibility.
  pub link_dependencies: Vec<String>,
}

/// The scheduler's output: the stages plus one record per module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPlan {
  pub stages: BuildPlan,
  pub modules: BTreeMap<String, ModulePlan>,
}

impl ResolvedPlan {
  pub fn module(&self, name: &str) -> Option<&ModulePlan> {
    self.modules.get(name)
  }

  /// Module records in execution order (stage, then name).
  pub fn records(&self) -> impl Iterator<Item = &ModulePlan> {
    self.stages.modules().filter_map(|name| self.modules.get(name))
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }
}
