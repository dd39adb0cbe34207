//! Module descriptors: the declarative input of a resolution pass.
//!
//! A descriptor states what a compiled unit needs (include paths, public and
//! private dependency modules, build options) without performing any
//! resolution itself. Descriptors are plain data and can be parsed from TOML.

mod parse;
mod types;

pub use parse::*;
pub use types::*;
