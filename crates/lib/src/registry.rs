//! The descriptor registry: one descriptor per named module.
//!
//! A resolution pass borrows the registry immutably for its whole duration,
//! so descriptors cannot change mid-pass. Concurrent passes against the same
//! registry are independent.

use std::collections::BTreeMap;

use tracing::debug;

use crate::descriptor::ModuleDescriptor;
use crate::error::RegistryError;

#[derive(Debug, Clone, Default)]
pub struct Registry {
  modules: BTreeMap<String, ModuleDescriptor>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register every descriptor, collecting all registry errors instead of
  /// stopping at the first one.
  pub fn from_descriptors(descriptors: impl IntoIterator<Item = ModuleDescriptor>) -> Result<Self, Vec<RegistryError>> {
    let mut registry = Self::new();
    let mut errors = Vec::new();
    for descriptor in descriptors {
      if let Err(e) = registry.register(descriptor) {
        errors.push(e);
      }
    }
    if errors.is_empty() { Ok(registry) } else { Err(errors) }
  }

  /// Add a descriptor.
  ///
  /// # Errors
  ///
  /// - `DuplicateModule` if a module with the same name is registered
  /// - `SelfDependency` if the descriptor names itself as a dependency
  /// - `ConflictingVisibility` if a module is both a public and a private dependency
  pub fn register(&mut self, descriptor: ModuleDescriptor) -> Result<(), RegistryError> {
    if self.modules.contains_key(&descriptor.name) {
      return Err(RegistryError::DuplicateModule(descriptor.name));
    }

    let (public_count, private_count) = {
      let public = descriptor.public_names();
      let private = descriptor.private_names();

      if public.contains(descriptor.name.as_str()) || private.contains(descriptor.name.as_str()) {
        return Err(RegistryError::SelfDependency(descriptor.name.clone()));
      }
      if let Some(dependency) = public.intersection(&private).next() {
        return Err(RegistryError::ConflictingVisibility {
          module: descriptor.name.clone(),
          dependency: dependency.to_string(),
        });
      }
      (public.len(), private.len())
    };

    debug!(
      module = %descriptor.name,
      public = public_count,
      private = private_count,
      "registered module"
    );
    self.modules.insert(descriptor.name.clone(), descriptor);
    Ok(())
  }

  /// Look up a descriptor by name.
  pub fn lookup(&self, name: &str) -> Result<&ModuleDescriptor, RegistryError> {
    self
      .modules
      .get(name)
      .ok_or_else(|| RegistryError::UnknownModule(name.to_string()))
  }

  pub fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
    self.modules.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.modules.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }

  /// Module names in ascending order.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.modules.keys().map(String::as_str)
  }

  /// Descriptors in ascending name order.
  pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
    self.modules.values()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn register_and_lookup() {
    let mut registry = Registry::new();
    registry.register(ModuleDescriptor::new("Core")).unwrap();

    assert_eq!(registry.lookup("Core").unwrap().name, "Core");
    assert!(registry.contains("Core"));
    assert_eq!(registry.len(), 1);
  }

  #[test]
  fn duplicate_name_is_rejected() {
    let mut registry = Registry::new();
    registry.register(ModuleDescriptor::new("Core")).unwrap();

    let err = registry.register(ModuleDescriptor::new("Core")).unwrap_err();
    assert_eq!(err, RegistryError::DuplicateModule("Core".to_string()));
    assert_eq!(registry.len(), 1);
  }

  #[test]
  fn lookup_of_absent_module_fails() {
    let registry = Registry::new();
    assert_eq!(
      registry.lookup("Ghost").unwrap_err(),
      RegistryError::UnknownModule("Ghost".to_string())
    );
  }

  #[test]
  fn self_dependency_is_rejected() {
    let mut registry = Registry::new();
    let err = registry
      .register(ModuleDescriptor::new("Engine").private_dep("Engine"))
      .unwrap_err();
    assert_eq!(err, RegistryError::SelfDependency("Engine".to_string()));
  }

  #[test]
  fn overlapping_public_and_private_is_rejected() {
    let mut registry = Registry::new();
    let err = registry
      .register(ModuleDescriptor::new("Engine").public_dep("Core").private_dep("Core"))
      .unwrap_err();
    assert_eq!(
      err,
      RegistryError::ConflictingVisibility {
        module: "Engine".to_string(),
        dependency: "Core".to_string(),
      }
    );
  }

  #[test]
  fn from_descriptors_reports_every_error() {
    let errors = Registry::from_descriptors(vec![
      ModuleDescriptor::new("A"),
      ModuleDescriptor::new("A"),
      ModuleDescriptor::new("B").public_dep("B"),
    ])
    .unwrap_err();

    assert_eq!(
      errors,
      vec![
        RegistryError::DuplicateModule("A".to_string()),
        RegistryError::SelfDependency("B".to_string()),
      ]
    );
  }

  #[test]
  fn names_are_sorted() {
    let registry =
      Registry::from_descriptors(vec![ModuleDescriptor::new("Slate"), ModuleDescriptor::new("Core")]).unwrap();
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Core", "Slate"]);
  }
}
