//! Implementation of the `modplan plan` command.
//!
//! Resolves every descriptor under a path for one target and prints the
//! staged build plan.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use modplan_lib::error::ResolveError;
use modplan_lib::plan::{BuildPlan, ModulePlan, PlanMode, ResolvedPlan};
use modplan_lib::resolve::resolve;

use super::invalid_graph;
use crate::load::load_registry;
use crate::output::{OutputFormat, count_noun, print_info, print_json, print_stat};
use crate::target::TargetArgs;

#[derive(Serialize)]
struct PlanOutput<'a> {
  target: Option<String>,
  tags: Vec<&'a str>,
  stages: &'a BuildPlan,
  modules: Vec<&'a ModulePlan>,
}

pub fn cmd_plan(
  path: &Path,
  target: &TargetArgs,
  require_nonempty: bool,
  format: OutputFormat,
  verbose: bool,
) -> Result<()> {
  let registry = load_registry(path)?;
  let context = target.context();
  let mode = if require_nonempty {
    PlanMode::RequireNonEmpty
  } else {
    PlanMode::AllowEmpty
  };

  let plan = match resolve(&registry, &context, mode) {
    Ok(plan) => plan,
    Err(ResolveError::Invalid(report)) => return Err(invalid_graph(report, format)),
    Err(e) => return Err(e.into()),
  };

  if format.is_json() {
    return print_json(&PlanOutput {
      target: context.platform().map(|p| p.triple()),
      tags: context.tags().collect(),
      stages: &plan.stages,
      modules: plan.records().collect(),
    });
  }

  print_info(&format!(
    "Plan for {}: {} in {}",
    context,
    count_noun(plan.modules.len(), "module"),
    count_noun(plan.stages.stage_count(), "stage")
  ));
  print_text(&plan, verbose);
  Ok(())
}

fn print_text(plan: &ResolvedPlan, verbose: bool) {
  for (index, stage) in plan.stages.stages().iter().enumerate() {
    println!("Stage {}:", index);
    for name in stage {
      println!("  {}", name);
      if !verbose {
        continue;
      }
      let Some(record) = plan.module(name) else {
        continue;
      };

      if !record.includes.is_empty() {
        let includes: Vec<&str> = record.includes.iter().map(String::as_str).collect();
        print_stat("  includes", &includes.join(", "));
      }
      if !record.public_dependencies.is_empty() {
        print_stat("  public", &record.public_dependencies.join(", "));
      }
      if !record.private_dependencies.is_empty() {
        print_stat("  private", &record.private_dependencies.join(", "));
      }
      if !record.options.is_empty() {
        let options: Vec<String> = record.options.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        print_stat("  options", &options.join(", "));
      }
    }
  }
}
