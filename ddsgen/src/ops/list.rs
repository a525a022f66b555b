use std::path::Path;

use ddsgen_codegen::Config;
use ddsgen_model::SpecResolver;

use crate::reports::ListReport;

pub fn list(spec_path: &Path, config: &Config) -> ListReport {
    let (mut generator, _handler) = super::open(spec_path, config);
    let target = generator.spec_mut().target_path().ok();
    ListReport {
        target,
        artifacts: generator.artifact_names(),
    }
}
