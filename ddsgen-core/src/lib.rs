//! Core utilities and types for the ddsgen code generator.
//!
//! This crate provides the collaborator seams the generator depends on
//! (file provider, error handler) plus small shared primitives.

mod diagnostic;
mod file;
mod memo;
mod utils;

// Error reporting
pub use diagnostic::{CollectingErrorHandler, Diagnostic, ErrorHandler, Severity, TracingErrorHandler};
// File operations
pub use file::{FileProvider, FsFileProvider, Resource, WriteResult};
// Memoization
pub use memo::Memo;
// String utilities
pub use utils::{file_stem, to_pascal_case, to_snake_case, to_upper_snake_case};
