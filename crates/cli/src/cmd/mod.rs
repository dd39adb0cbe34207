mod check;
mod graph;
mod info;
mod plan;

pub use check::cmd_check;
pub use graph::cmd_graph;
pub use info::cmd_info;
pub use plan::cmd_plan;

use modplan_lib::error::ViolationReport;

use crate::output::{OutputFormat, print_json};

/// Turn a violation report into the command's error. In JSON mode the
/// report is also printed to stdout.
fn invalid_graph(report: ViolationReport, format: OutputFormat) -> anyhow::Error {
  if format.is_json() {
    if let Err(e) = print_json(&report) {
      return e;
    }
    anyhow::anyhow!("{} configuration error(s) in module graph", report.len())
  } else {
    anyhow::Error::new(report)
  }
}
