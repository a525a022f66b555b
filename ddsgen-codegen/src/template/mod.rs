//! Template transformation engine.
//!
//! - [`UriResolver`] - locates included templates and sibling documents
//! - [`TemplateEngine`] - compiles, caches and runs template programs
//! - [`filters`] - filters exposing the document tree to templates

mod engine;
pub mod filters;
mod uri;

pub use engine::{CompiledTemplate, TemplateCache, TemplateEngine, template_refs};
pub use uri::UriResolver;
