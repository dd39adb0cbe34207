//! The target context a resolution pass evaluates predicates against.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::Platform;
use super::predicate::Predicate;

/// The set of tags describing one build target.
///
/// Constructed once per plan-build invocation. A platform contributes its OS,
/// its architecture and its triple (`windows`, `x86_64`, `x86_64-windows`);
/// feature flags contribute themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetContext {
  platform: Option<Platform>,
  tags: BTreeSet<String>,
}

impl TargetContext {
  /// An empty context. Only negated predicates hold against it.
  pub fn new() -> Self {
    Self::default()
  }

  /// A context describing `platform`.
  pub fn for_platform(platform: Platform) -> Self {
    Self {
      platform: Some(platform),
      tags: BTreeSet::new(),
    }
    .with_tag(platform.os.as_str())
    .with_tag(platform.arch.as_str())
    .with_tag(&platform.triple())
  }

  /// A context describing the host, or an empty one on unsupported hosts.
  pub fn current() -> Self {
    Platform::current().map(Self::for_platform).unwrap_or_default()
  }

  /// Add a tag (feature flags are plain tags).
  pub fn with_tag(mut self, tag: &str) -> Self {
    self.insert_tag(tag);
    self
  }

  pub fn insert_tag(&mut self, tag: &str) {
    let tag = tag.trim();
    if !tag.is_empty() {
      self.tags.insert(tag.to_ascii_lowercase());
    }
  }

  pub fn platform(&self) -> Option<Platform> {
    self.platform
  }

  pub fn has_tag(&self, tag: &str) -> bool {
    self.tags.contains(&tag.to_ascii_lowercase())
  }

  /// Tags in ascending order.
  pub fn tags(&self) -> impl Iterator<Item = &str> {
    self.tags.iter().map(String::as_str)
  }

  /// Whether an entry guarded by `predicate` survives in this context.
  /// Unguarded entries always survive.
  pub fn matches(&self, predicate: Option<&Predicate>) -> bool {
    predicate.is_none_or(|p| p.evaluate(self))
  }
}

impl fmt::Display for TargetContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.platform {
      Some(platform) => write!(f, "{}", platform)?,
      None => write!(f, "<no platform>")?,
    }
    let features: Vec<&str> = self
      .tags()
      .filter(|tag| match self.platform {
        Some(p) => *tag != p.os.as_str() && *tag != p.arch.as_str() && *tag != p.triple(),
        None => true,
      })
      .collect();
    if !features.is_empty() {
      write!(f, " [{}]", features.join(", "))?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::arch::Arch;
  use crate::platform::os::Os;

  #[test]
  fn platform_contributes_os_arch_and_triple() {
    let context = TargetContext::for_platform(Platform::new(Arch::X86_64, Os::Windows));

    let tags: Vec<&str> = context.tags().collect();
    assert_eq!(tags, vec!["windows", "x86_64", "x86_64-windows"]);
    assert_eq!(context.platform(), Some(Platform::new(Arch::X86_64, Os::Windows)));
  }

  #[test]
  fn unguarded_entries_always_match() {
    assert!(TargetContext::new().matches(None));
  }

  #[test]
  fn display_lists_features_after_platform() {
    let context = TargetContext::for_platform(Platform::new(Arch::Aarch64, Os::Linux)).with_tag("Editor");
    assert_eq!(context.to_string(), "aarch64-linux [editor]");
    assert_eq!(TargetContext::new().to_string(), "<no platform>");
  }
}
