//! Implementation of the `modplan check` command.
//!
//! Validates descriptors for one target and reports every configuration
//! error in a single run.

use std::path::Path;

use anyhow::Result;
use serde_json::json;

use modplan_lib::error::ResolveError;
use modplan_lib::plan::PlanMode;
use modplan_lib::resolve::resolve;

use super::invalid_graph;
use crate::load::load_registry;
use crate::output::{OutputFormat, count_noun, print_json, print_success};
use crate::target::TargetArgs;

pub fn cmd_check(path: &Path, target: &TargetArgs, format: OutputFormat) -> Result<()> {
  let registry = load_registry(path)?;
  let context = target.context();

  match resolve(&registry, &context, PlanMode::AllowEmpty) {
    Ok(plan) => {
      if format.is_json() {
        print_json(&json!({
          "valid": true,
          "modules": plan.modules.len(),
          "stages": plan.stages.stage_count(),
        }))
      } else {
        print_success(&format!(
          "{} valid for {}",
          count_noun(plan.modules.len(), "module"),
          context
        ));
        Ok(())
      }
    }
    Err(ResolveError::Invalid(report)) => Err(invalid_graph(report, format)),
    Err(e) => Err(e.into()),
  }
}
