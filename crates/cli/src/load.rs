//! Descriptor discovery and loading.
//!
//! A path is either a single descriptor file or a directory searched
//! recursively for `*.toml` files. Files are read in sorted path order so
//! that registration order, and therefore error order, is stable.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};
use walkdir::WalkDir;

use modplan_lib::descriptor::{ModuleDescriptor, parse_descriptors};
use modplan_lib::registry::Registry;

/// Find descriptor files under `path`.
pub fn discover(path: &Path) -> Result<Vec<PathBuf>> {
  if !path.exists() {
    bail!("Descriptor path not found: {}", path.display());
  }
  if path.is_file() {
    return Ok(vec![path.to_path_buf()]);
  }

  let mut files = Vec::new();
  for entry in WalkDir::new(path).sort_by_file_name() {
    let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
    if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "toml") {
      files.push(entry.into_path());
    }
  }
  files.sort();

  debug!(root = %path.display(), files = files.len(), "discovered descriptor files");
  Ok(files)
}

/// Parse every descriptor under `path`.
pub fn load_descriptors(path: &Path) -> Result<Vec<ModuleDescriptor>> {
  let mut descriptors = Vec::new();
  for file in discover(path)? {
    let source = fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file.display()))?;
    let parsed = parse_descriptors(&source, &file.display().to_string())?;
    debug!(file = %file.display(), modules = parsed.len(), "loaded descriptors");
    descriptors.extend(parsed);
  }
  Ok(descriptors)
}

/// Load and register every descriptor under `path`.
///
/// All registry errors are reported together.
pub fn load_registry(path: &Path) -> Result<Registry> {
  let descriptors = load_descriptors(path)?;
  let registry = Registry::from_descriptors(descriptors).map_err(|errors| {
    let lines: Vec<String> = errors.iter().map(|e| format!("  - {}", e)).collect();
    anyhow::anyhow!("Invalid module descriptors:\n{}", lines.join("\n"))
  })?;

  info!(path = %path.display(), modules = registry.len(), "loaded module registry");
  Ok(registry)
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  #[test]
  fn loads_directory_recursively_in_sorted_order() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Runtime/Engine.toml", "name = \"Engine\"\npublic_dependencies = [\"Core\"]\n");
    write(temp.path(), "Runtime/Core/Core.toml", "name = \"Core\"\n");
    write(temp.path(), "README.md", "not a descriptor");

    let files = discover(temp.path()).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files[0] < files[1]);

    let registry = load_registry(temp.path()).unwrap();
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Core", "Engine"]);
  }

  #[test]
  fn duplicate_modules_across_files_are_all_reported() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a.toml", "[[module]]\nname = \"Core\"\n[[module]]\nname = \"Slate\"\n");
    write(temp.path(), "b.toml", "[[module]]\nname = \"Core\"\n[[module]]\nname = \"Slate\"\n");

    let err = load_registry(temp.path()).unwrap_err().to_string();
    assert!(err.contains("'Core' is already registered"));
    assert!(err.contains("'Slate' is already registered"));
  }

  #[test]
  fn parse_errors_name_the_file() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "broken.toml", "[[module]\n");

    let err = format!("{:#}", load_registry(temp.path()).unwrap_err());
    assert!(err.contains("broken.toml"));
  }

  #[test]
  fn missing_path_fails() {
    assert!(discover(Path::new("/nonexistent/modplan/modules")).is_err());
  }
}
