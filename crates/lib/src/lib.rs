//! modplan-lib: module dependency resolution and build planning
//!
//! Turns declarative module descriptors into a staged, parallelizable
//! build plan:
//! - `Registry`: one `ModuleDescriptor` per named module
//! - `ModuleGraph`: descriptors resolved against a `TargetContext`
//! - `ValidatedGraph`: a graph with no cycles and no private-dependency leaks
//! - `ResolvedPlan`: stages plus each module's effective includes and options
//!
//! The crate performs no I/O. Executing the plan is the orchestrator's job.

pub mod descriptor;
pub mod error;
pub mod graph;
pub mod plan;
pub mod platform;
pub mod registry;
pub mod resolve;
