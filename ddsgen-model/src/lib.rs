// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

//! Model documents for ddsgen.
//!
//! This crate parses `.opendds` models and `.codegen` generation specs into
//! an owned XML tree, caches them per source path, and inlines
//! cross-document references before templates see them.

mod cache;
mod document;
mod error;
pub mod genspec;
pub mod query;
mod resolve;

pub use cache::DocumentCache;
pub use document::{Descendants, Document, Element, Node, XSI_TYPE};
pub use error::{Error, Result};
pub use genspec::{
    DocumentSpec, GenerationSpec, InstanceConfig, LiveSpec, SpecResolver, TransportConfig,
};
pub use resolve::{RESOLVE_TRANSFORM, ReferenceResolver, XmlReferenceResolver};
