//! Batch generation straight from a model file.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use ddsgen_core::{ErrorHandler, FileProvider, FsFileProvider, file_stem};
use ddsgen_model::{DocumentSpec, SpecResolver};
use eyre::{Result, WrapErr, eyre};

use crate::{Config, Generation, Generator, TransformKind};

/// Generation spec written next to `model` for batch runs.
pub fn spec_path_for(model: &Path) -> Result<PathBuf> {
    let stem = file_stem(model).ok_or_else(|| eyre!("'{}' has no file name", model.display()))?;
    Ok(model.with_file_name(format!("{stem}.codegen")))
}

/// Write (or update) the generation spec for `model`.
///
/// `target` defaults to the model's own directory.
pub fn write_spec(
    model: &Path,
    target: Option<&Path>,
    provider: Arc<dyn FileProvider>,
    handler: Arc<dyn ErrorHandler>,
) -> Result<DocumentSpec> {
    let file_name = model
        .file_name()
        .ok_or_else(|| eyre!("'{}' has no file name", model.display()))?
        .to_string_lossy()
        .into_owned();
    let target_name = match target {
        Some(target) => std::path::absolute(target)
            .wrap_err_with(|| format!("invalid target directory '{}'", target.display()))?
            .display()
            .to_string(),
        None => ".".to_string(),
    };

    let spec_path = spec_path_for(model)?;
    let mut spec = DocumentSpec::new(provider, handler, &spec_path);
    spec.set_model_file_name(&file_name)?;
    spec.set_target_dir_name(&target_name)?;
    spec.save()
        .wrap_err_with(|| format!("failed to write '{}'", spec_path.display()))?;
    tracing::debug!(spec = %spec_path.display(), "wrote generation spec");
    Ok(spec)
}

/// Generate every artifact for `model`, stopping at the first failure.
pub fn generate_model(
    model: &Path,
    target: Option<&Path>,
    config: &Config,
    handler: Arc<dyn ErrorHandler>,
) -> Result<Vec<Generation>> {
    let provider: Arc<dyn FileProvider> =
        Arc::new(FsFileProvider::new(PathBuf::new(), config.bundle_dir()));
    let spec = write_spec(model, target, Arc::clone(&provider), Arc::clone(&handler))?;
    let mut generator = Generator::new(spec, provider, handler).with_config(config);

    let mut generations = Vec::with_capacity(TransformKind::ARTIFACTS.len());
    for kind in TransformKind::ARTIFACTS {
        let generation = generator
            .try_generate(kind)
            .wrap_err_with(|| format!("failed to generate {kind} for '{}'", model.display()))?;
        generations.push(generation);
    }
    Ok(generations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_path_for() {
        assert_eq!(
            spec_path_for(Path::new("models/demo.opendds")).unwrap(),
            PathBuf::from("models/demo.codegen")
        );
        assert!(spec_path_for(Path::new("")).is_err());
    }
}
