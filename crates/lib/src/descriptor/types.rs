use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::platform::Predicate;

/// Well-known build option keys.
///
/// Unknown keys are carried through resolution untouched.
pub mod keys {
  /// Integer. Minimum number of source files before a precompiled header is used.
  pub const MIN_FILES_USING_PCH: &str = "min_files_using_pch";

  /// Boolean. Compile this module's sources individually instead of in unity batches.
  pub const UNITY_DISABLED: &str = "unity_disabled";

  /// String. How the module uses precompiled headers (e.g. "shared", "explicit", "none").
  pub const PCH_USAGE: &str = "pch_usage";
}

/// Whether a dependency or include path propagates to consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
  /// Visible transitively to consumers of the declaring module.
  #[default]
  Public,
  /// Visible only to the declaring module's own compilation.
  Private,
}

impl Visibility {
  pub fn is_public(self) -> bool {
    matches!(self, Visibility::Public)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Visibility::Public => "public",
      Visibility::Private => "private",
    }
  }
}

impl fmt::Display for Visibility {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// An include path, optionally restricted to targets matching a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IncludeEntryRepr")]
pub struct IncludeEntry {
  pub path: String,
  pub visibility: Visibility,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub when: Option<Predicate>,
}

/// Accepts either a bare path string or a full table.
#[derive(Deserialize)]
#[serde(untagged)]
enum IncludeEntryRepr {
  Path(String),
  Full(IncludeTable),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct IncludeTable {
  path: String,
  #[serde(default)]
  visibility: Visibility,
  #[serde(default)]
  when: Option<Predicate>,
}

impl From<IncludeEntryRepr> for IncludeEntry {
  fn from(repr: IncludeEntryRepr) -> Self {
    match repr {
      IncludeEntryRepr::Path(path) => IncludeEntry {
        path,
        visibility: Visibility::Public,
        when: None,
      },
      IncludeEntryRepr::Full(IncludeTable { path, visibility, when }) => IncludeEntry { path, visibility, when },
    }
  }
}

/// A reference to another module by name, optionally conditional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DependencyRefRepr")]
pub struct DependencyRef {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub when: Option<Predicate>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DependencyRefRepr {
  Name(String),
  Full(DependencyTable),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DependencyTable {
  name: String,
  #[serde(default)]
  when: Option<Predicate>,
}

impl From<DependencyRefRepr> for DependencyRef {
  fn from(repr: DependencyRefRepr) -> Self {
    match repr {
      DependencyRefRepr::Name(name) => DependencyRef { name, when: None },
      DependencyRefRepr::Full(DependencyTable { name, when }) => DependencyRef { name, when },
    }
  }
}

impl DependencyRef {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      when: None,
    }
  }

  pub fn when(mut self, predicate: Predicate) -> Self {
    self.when = Some(predicate);
    self
  }
}

impl From<&str> for DependencyRef {
  fn from(name: &str) -> Self {
    Self::new(name)
  }
}

/// A build option value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
  Bool(bool),
  Int(i64),
  String(String),
}

impl OptionValue {
  pub fn as_bool(&self) -> Option<bool> {
    match self {
      OptionValue::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      OptionValue::Int(n) => Some(*n),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      OptionValue::String(s) => Some(s),
      _ => None,
    }
  }
}

impl fmt::Display for OptionValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OptionValue::Bool(b) => write!(f, "{}", b),
      OptionValue::Int(n) => write!(f, "{}", n),
      OptionValue::String(s) => write!(f, "{:?}", s),
    }
  }
}

impl From<bool> for OptionValue {
  fn from(value: bool) -> Self {
    OptionValue::Bool(value)
  }
}

impl From<i64> for OptionValue {
  fn from(value: i64) -> Self {
    OptionValue::Int(value)
  }
}

impl From<&str> for OptionValue {
  fn from(value: &str) -> Self {
    OptionValue::String(value.to_string())
  }
}

/// A named build option. Within one module, later entries override earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionEntry {
  pub key: String,
  pub value: OptionValue,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub when: Option<Predicate>,
}

/// Everything a compiled unit declares about itself.
///
/// Invariants (checked by [`crate::registry::Registry::register`]): the public
/// and private dependency sets are disjoint and never contain the module itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDescriptor {
  /// Unique module name.
  pub name: String,

  /// Include paths in declaration order.
  #[serde(default)]
  pub includes: Vec<IncludeEntry>,

  /// Dependencies whose interface propagates to this module's consumers.
  #[serde(default)]
  pub public_dependencies: Vec<DependencyRef>,

  /// Dependencies used only by this module's own compilation.
  #[serde(default)]
  pub private_dependencies: Vec<DependencyRef>,

  /// Modules whose headers this module's sources include.
  ///
  /// Checked against the visibility rule: each must be a direct dependency or
  /// reachable from one through public dependencies only.
  #[serde(default)]
  pub uses: Vec<DependencyRef>,

  /// Build options in declaration order.
  #[serde(default)]
  pub options: Vec<OptionEntry>,
}

impl ModuleDescriptor {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      includes: Vec::new(),
      public_dependencies: Vec::new(),
      private_dependencies: Vec::new(),
      uses: Vec::new(),
      options: Vec::new(),
    }
  }

  /// Add a public include path.
  pub fn include(self, path: &str) -> Self {
    self.include_entry(path, Visibility::Public, None)
  }

  /// Add a private include path.
  pub fn private_include(self, path: &str) -> Self {
    self.include_entry(path, Visibility::Private, None)
  }

  pub fn include_entry(mut self, path: &str, visibility: Visibility, when: Option<Predicate>) -> Self {
    self.includes.push(IncludeEntry {
      path: path.to_string(),
      visibility,
      when,
    });
    self
  }

  pub fn public_dep(mut self, dep: impl Into<DependencyRef>) -> Self {
    self.public_dependencies.push(dep.into());
    self
  }

  pub fn private_dep(mut self, dep: impl Into<DependencyRef>) -> Self {
    self.private_dependencies.push(dep.into());
    self
  }

  pub fn uses(mut self, module: impl Into<DependencyRef>) -> Self {
    self.uses.push(module.into());
    self
  }

  pub fn option(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
    self.options.push(OptionEntry {
      key: key.to_string(),
      value: value.into(),
      when: None,
    });
    self
  }

  /// Names of public dependencies, regardless of predicates.
  pub fn public_names(&self) -> BTreeSet<&str> {
    self.public_dependencies.iter().map(|d| d.name.as_str()).collect()
  }

  /// Names of private dependencies, regardless of predicates.
  pub fn private_names(&self) -> BTreeSet<&str> {
    self.private_dependencies.iter().map(|d| d.name.as_str()).collect()
  }
}
