//! Generate operation.

use std::path::Path;

use ddsgen_codegen::{Config, TransformKind};

use crate::reports::GenerateReport;

/// Run the requested kinds, or every artifact when none are named.
pub fn generate(spec_path: &Path, config: &Config, kinds: &[TransformKind]) -> GenerateReport {
    let (mut generator, handler) = super::open(spec_path, config);

    let generations = if kinds.is_empty() {
        generator.generate_all()
    } else {
        kinds.iter().map(|&kind| generator.generate(kind)).collect()
    };

    GenerateReport {
        spec_path: spec_path.to_path_buf(),
        generations,
        diagnostics: handler.diagnostics(),
    }
}
