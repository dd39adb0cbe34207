//! Target selection shared by the resolving commands.

use clap::Args;
use tracing::warn;

use modplan_lib::platform::{Platform, TargetContext};

#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
  /// Target platform as <arch>-<os> (defaults to the host)
  #[arg(long, env = "MODPLAN_TARGET")]
  pub target: Option<Platform>,

  /// Feature tag to enable; repeat or comma-separate for several
  #[arg(long = "feature", env = "MODPLAN_FEATURES", value_delimiter = ',')]
  pub features: Vec<String>,
}

impl TargetArgs {
  /// Build the context predicates are evaluated against.
  pub fn context(&self) -> TargetContext {
    let mut context = match self.target.or_else(Platform::current) {
      Some(platform) => TargetContext::for_platform(platform),
      None => {
        warn!("host platform is not supported; only feature tags will match");
        TargetContext::new()
      }
    };
    for feature in &self.features {
      context.insert_tag(feature);
    }
    context
  }
}

#[cfg(test)]
mod tests {
  use clap::Parser;

  use super::*;

  #[derive(Parser)]
  struct Harness {
    #[command(flatten)]
    target: TargetArgs,
  }

  #[test]
  fn explicit_target_and_features() {
    let harness = Harness::try_parse_from(["test", "--target", "aarch64-darwin", "--feature", "editor"]).unwrap();
    let context = harness.target.context();

    assert!(context.has_tag("darwin"));
    assert!(context.has_tag("aarch64"));
    assert!(context.has_tag("editor"));
    assert!(!context.has_tag("windows"));
  }

  #[test]
  fn environment_supplies_defaults() {
    temp_env::with_vars(
      [
        ("MODPLAN_TARGET", Some("x86_64-windows")),
        ("MODPLAN_FEATURES", Some("editor,server")),
      ],
      || {
        let harness = Harness::try_parse_from(["test"]).unwrap();
        let context = harness.target.context();

        assert!(context.has_tag("windows"));
        assert!(context.has_tag("editor"));
        assert!(context.has_tag("server"));
      },
    );
  }

  #[test]
  fn host_platform_is_the_default() {
    temp_env::with_vars_unset(["MODPLAN_TARGET", "MODPLAN_FEATURES"], || {
      let harness = Harness::try_parse_from(["test"]).unwrap();
      assert_eq!(harness.target.context().platform(), Platform::current());
    });
  }

  #[test]
  fn invalid_target_is_rejected() {
    assert!(Harness::try_parse_from(["test", "--target", "vax-vms"]).is_err());
  }
}
