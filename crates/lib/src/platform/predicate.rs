//! Platform predicates attached to include entries, dependency references and options.
//!
//! A predicate is a single tag, optionally negated with a leading `!`:
//!
//! - `windows` holds when the target context carries the `windows` tag
//! - `!editor` holds when the target context does not carry `editor`
//!
//! Tags are compared case-insensitively.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TargetContext;

/// Errors parsing a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
  #[error("empty platform predicate")]
  Empty,

  #[error("invalid character '{ch}' in platform predicate '{predicate}'")]
  InvalidCharacter { predicate: String, ch: char },
}

/// A condition evaluated once per resolution against the target context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Predicate {
  tag: String,
  negated: bool,
}

impl Predicate {
  /// A predicate that holds when `tag` is present.
  pub fn tag(tag: &str) -> Result<Self, PredicateError> {
    validate_tag(tag)?;
    Ok(Self {
      tag: tag.to_ascii_lowercase(),
      negated: false,
    })
  }

  /// A predicate that holds when `tag` is absent.
  pub fn not(tag: &str) -> Result<Self, PredicateError> {
    Ok(Self {
      negated: true,
      ..Self::tag(tag)?
    })
  }

  pub fn tag_name(&self) -> &str {
    &self.tag
  }

  pub fn is_negated(&self) -> bool {
    self.negated
  }

  /// Evaluate against a target context.
  pub fn evaluate(&self, context: &TargetContext) -> bool {
    context.has_tag(&self.tag) != self.negated
  }
}

fn validate_tag(tag: &str) -> Result<(), PredicateError> {
  if tag.is_empty() {
    return Err(PredicateError::Empty);
  }
  if let Some(ch) = tag
    .chars()
    .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
  {
    return Err(PredicateError::InvalidCharacter {
      predicate: tag.to_string(),
      ch,
    });
  }
  Ok(())
}

impl FromStr for Predicate {
  type Err = PredicateError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    match s.strip_prefix('!') {
      Some(rest) => Self::not(rest.trim_start()),
      None => Self::tag(s),
    }
  }
}

impl TryFrom<String> for Predicate {
  type Error = PredicateError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Predicate> for String {
  fn from(predicate: Predicate) -> Self {
    predicate.to_string()
  }
}

impl fmt::Display for Predicate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.negated {
      write!(f, "!{}", self.tag)
    } else {
      write!(f, "{}", self.tag)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_plain_and_negated() {
    let p: Predicate = "Windows".parse().unwrap();
    assert_eq!(p.tag_name(), "windows");
    assert!(!p.is_negated());

    let p: Predicate = "!editor".parse().unwrap();
    assert_eq!(p.tag_name(), "editor");
    assert!(p.is_negated());
    assert_eq!(p.to_string(), "!editor");
  }

  #[test]
  fn rejects_empty_and_garbage() {
    assert_eq!("".parse::<Predicate>(), Err(PredicateError::Empty));
    assert_eq!("!".parse::<Predicate>(), Err(PredicateError::Empty));
    assert!(matches!(
      "windows || linux".parse::<Predicate>(),
      Err(PredicateError::InvalidCharacter { ch: ' ', .. })
    ));
  }

  #[test]
  fn evaluates_against_context() {
    let context = TargetContext::new().with_tag("windows").with_tag("editor");

    assert!("windows".parse::<Predicate>().unwrap().evaluate(&context));
    assert!(!"linux".parse::<Predicate>().unwrap().evaluate(&context));
    assert!(!"!editor".parse::<Predicate>().unwrap().evaluate(&context));
    assert!("!server".parse::<Predicate>().unwrap().evaluate(&context));
  }
}
