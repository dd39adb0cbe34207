use anyhow::Result;
use serde_json::json;

use modplan_lib::platform::{TargetContext, platform_triple};

use crate::output::{OutputFormat, print_json};

pub fn cmd_info(format: OutputFormat) -> Result<()> {
  let context = TargetContext::current();
  let tags: Vec<&str> = context.tags().collect();

  if format.is_json() {
    return print_json(&json!({
      "platform": platform_triple(),
      "tags": tags,
    }));
  }

  println!("System:");
  match platform_triple() {
    Some(triple) => println!("Platform: {}", triple),
    _ => println!("Could not detect platform."),
  }
  println!("Tags: {}", tags.join(", "));
  Ok(())
}
