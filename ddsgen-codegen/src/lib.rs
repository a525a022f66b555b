//! Template-driven artifact generation for OpenDDS models.
//!
//! # Module Organization
//!
//! - [`kinds`] - The fixed table of transformations (TransformKind)
//! - [`template`] - Template engine, cache and include resolution
//! - [`generator`] - The orchestrator running transformations for a spec
//! - [`batch`] - Fail-fast generation straight from a model file
//! - [`config`] - `ddsgen.toml` settings
//! - [`testing`] - Test fixtures (feature-gated)

pub mod batch;
pub mod config;
pub mod generator;
pub mod kinds;
pub mod state;
pub mod template;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::Config;
pub use generator::{Generation, Generator};
pub use kinds::{InputSelection, Program, TransformInfo, TransformKind};
pub use state::{GenerationState, StateMachine};
