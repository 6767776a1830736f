//! Generator evaluation and rendering engine for fanout.
//!
//! This crate consumes validated specifications plus a registry snapshot and
//! produces the deterministically ordered set of target definitions.

pub mod engine;
pub mod errors;
pub mod generators;
pub mod model;
pub mod normalize;
pub mod output;
pub mod render;

pub use engine::{GenerationEngine, GenerationResult};
pub use errors::GenerationError;
pub use model::{GenerateOptions, GenerationReport, SpecFailure, SpecReport};
pub use output::yaml::write_targets;
pub use render::{RenderError, Renderer};
