//! TOML descriptor documents.
//!
//! A document either holds one or more `[[module]]` tables or is itself a
//! single module table (top-level `name = ...`).

use serde::Deserialize;
use thiserror::Error;
use tracing::trace;

use super::types::ModuleDescriptor;

/// A descriptor document that failed to parse.
#[derive(Debug, Error)]
#[error("failed to parse descriptors from {origin}: {source}")]
pub struct ParseError {
  /// Where the document came from (usually a file path).
  pub origin: String,
  #[source]
  pub source: toml::de::Error,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DescriptorDocument {
  #[serde(default)]
  module: Vec<ModuleDescriptor>,
}

/// Parse every module descriptor in a TOML document.
///
/// `origin` only labels errors.
pub fn parse_descriptors(source: &str, origin: &str) -> Result<Vec<ModuleDescriptor>, ParseError> {
  let wrap = |source: toml::de::Error| ParseError {
    origin: origin.to_string(),
    source,
  };

  let table: toml::Table = toml::from_str(source).map_err(wrap)?;
  let modules = if table.contains_key("name") {
    vec![toml::from_str::<ModuleDescriptor>(source).map_err(wrap)?]
  } else {
    toml::from_str::<DescriptorDocument>(source).map_err(wrap)?.module
  };

  trace!(origin, count = modules.len(), "parsed descriptors");
  Ok(modules)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::descriptor::{OptionValue, Visibility, keys};

  const TETRA: &str = r#"
[[module]]
name = "TendrModelTetra"
includes = [
  { path = "TendrModelTetra/Private", visibility = "private" },
  { path = "Runtime/Windows/D3D11RHI/Private", visibility = "private", when = "windows" },
]
public_dependencies = ["Core", "CoreUObject", "Engine", "RenderCore", "ShaderCore"]
private_dependencies = ["Slate", "SlateCore", { name = "UnrealEd", when = "editor" }]
options = [
  { key = "min_files_using_pch", value = 1 },
  { key = "unity_disabled", value = true },
]

[[module]]
name = "Core"
includes = ["Core/Public"]
"#;

  #[test]
  fn parses_module_array() {
    let modules = parse_descriptors(TETRA, "tetra.toml").unwrap();
    assert_eq!(modules.len(), 2);

    let tetra = &modules[0];
    assert_eq!(tetra.name, "TendrModelTetra");
    assert_eq!(tetra.includes.len(), 2);
    assert_eq!(tetra.includes[0].visibility, Visibility::Private);
    assert_eq!(tetra.includes[1].when.as_ref().unwrap().tag_name(), "windows");
    assert_eq!(tetra.public_dependencies.len(), 5);
    assert_eq!(tetra.private_dependencies[2].name, "UnrealEd");
    assert_eq!(tetra.options[0].key, keys::MIN_FILES_USING_PCH);
    assert_eq!(tetra.options[1].value, OptionValue::Bool(true));

    let core = &modules[1];
    assert_eq!(core.includes[0].path, "Core/Public");
    assert_eq!(core.includes[0].visibility, Visibility::Public);
    assert!(core.includes[0].when.is_none());
  }

  #[test]
  fn parses_single_module_document() {
    let source = r#"
name = "Engine"
includes = ["Engine/Public"]
public_dependencies = ["Core"]
"#;
    let modules = parse_descriptors(source, "Engine.toml").unwrap();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].name, "Engine");
  }

  #[test]
  fn empty_document_has_no_modules() {
    assert!(parse_descriptors("", "empty.toml").unwrap().is_empty());
  }

  #[test]
  fn error_names_origin() {
    let err = parse_descriptors("[[module]]\nname = 3\n", "broken.toml").unwrap_err();
    assert_eq!(err.origin, "broken.toml");
    assert!(err.to_string().contains("broken.toml"));
  }

  #[test]
  fn rejects_unknown_fields() {
    let source = "[[module]]\nname = \"A\"\npublic_deps = [\"B\"]\n";
    assert!(parse_descriptors(source, "typo.toml").is_err());
  }

  #[test]
  fn rejects_misspelled_include_key() {
    // A typo in `visibility` must not turn a private include public
    let source = "[[module]]\nname = \"A\"\nincludes = [{ path = \"A/Private\", visiblity = \"private\" }]\n";
    assert!(parse_descriptors(source, "typo.toml").is_err());
  }

  #[test]
  fn rejects_misspelled_dependency_key() {
    let source = "[[module]]\nname = \"A\"\nprivate_dependencies = [{ name = \"B\", wen = \"windows\" }]\n";
    assert!(parse_descriptors(source, "typo.toml").is_err());
  }

  #[test]
  fn rejects_misspelled_option_key() {
    let source = "[[module]]\nname = \"A\"\noptions = [{ key = \"unity_disabled\", value = true, wen = \"editor\" }]\n";
    assert!(parse_descriptors(source, "typo.toml").is_err());
  }

  #[test]
  fn rejects_invalid_predicate() {
    let source = "[[module]]\nname = \"A\"\nprivate_dependencies = [{ name = \"B\", when = \"\" }]\n";
    assert!(parse_descriptors(source, "bad.toml").is_err());
  }
}
