//! Target platforms and the context platform predicates are evaluated against.

pub mod arch;
pub mod context;
pub mod os;
pub mod predicate;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use arch::Arch;
use os::Os;

pub use context::TargetContext;
pub use predicate::Predicate;

/// Errors parsing platform identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
  #[error("unknown operating system '{0}' (expected linux, darwin or windows)")]
  UnknownOs(String),

  #[error("unknown architecture '{0}' (expected x86_64 or aarch64)")]
  UnknownArch(String),

  #[error("invalid platform '{0}' (expected <arch>-<os>, e.g. x86_64-windows)")]
  InvalidTriple(String),
}

/// Platform identifier combining architecture and OS (e.g., "x86_64-windows")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  /// Create a new platform identifier
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// Detect the current platform at runtime
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn current() -> Option<Self> {
    Some(Self {
      arch: Arch::current()?,
      os: Os::current()?,
    })
  }

  /// Returns the platform triple string (e.g., "aarch64-darwin")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}

impl FromStr for Platform {
  type Err = PlatformError;

  /// Accepts `<arch>-<os>` as well as the reversed `<os>-<arch>` spelling.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let Some((first, second)) = s.split_once('-') else {
      return Err(PlatformError::InvalidTriple(s.to_string()));
    };

    if let (Ok(arch), Ok(os)) = (first.parse::<Arch>(), second.parse::<Os>()) {
      return Ok(Self::new(arch, os));
    }
    if let (Ok(os), Ok(arch)) = (first.parse::<Os>(), second.parse::<Arch>()) {
      return Ok(Self::new(arch, os));
    }
    Err(PlatformError::InvalidTriple(s.to_string()))
  }
}

/// Returns the platform triple for the current system (e.g., "aarch64-darwin")
///
/// Returns `None` if the current platform is not supported
pub fn platform_triple() -> Option<String> {
  Platform::current().map(|p| p.triple())
}
