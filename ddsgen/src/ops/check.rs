//! Check operation - spec validation.

use std::path::Path;

use ddsgen_codegen::Config;
use ddsgen_model::SpecResolver;

use crate::reports::CheckReport;

/// Validate the spec and collect what the model declares.
pub fn check(spec_path: &Path, config: &Config) -> CheckReport {
    let (mut generator, handler) = super::open(spec_path, config);

    let problem = generator.validate();
    let mut report = CheckReport {
        spec_path: spec_path.to_path_buf(),
        problem,
        model_name: None,
        transport_ids: Vec::new(),
        has_data_library: false,
        artifacts: Vec::new(),
        diagnostics: Vec::new(),
    };

    if report.problem.is_none() {
        if let Ok(cache) = generator.spec_mut().model() {
            report.model_name = cache.model_name();
            report.transport_ids = cache.transport_ids().into_iter().collect();
            report.has_data_library = cache.has_data_library();
        }
        report.artifacts = generator.artifact_names();
    }
    report.diagnostics = handler.diagnostics();
    report
}
