//! Core operations.
//!
//! This module contains the business logic for ddsgen commands,
//! separated from CLI argument parsing and output rendering.

mod check;
mod generate;
mod list;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use ddsgen_codegen::{Config, Generator};
use ddsgen_core::{CollectingErrorHandler, FileProvider, FsFileProvider};
use ddsgen_model::DocumentSpec;

pub use check::check;
pub use generate::generate;
pub use list::list;

/// A generator over the spec at `spec_path`, recording every report.
fn open(spec_path: &Path, config: &Config) -> (Generator, Arc<CollectingErrorHandler>) {
    let provider: Arc<dyn FileProvider> =
        Arc::new(FsFileProvider::new(PathBuf::new(), config.bundle_dir()));
    let handler = Arc::new(CollectingErrorHandler::new());
    let spec = DocumentSpec::new(Arc::clone(&provider), handler.clone(), spec_path);
    let generator = Generator::new(spec, provider, handler.clone()).with_config(config);
    (generator, handler)
}
