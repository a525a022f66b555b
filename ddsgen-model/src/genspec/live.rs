use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use ddsgen_core::{ErrorHandler, FileProvider};

use super::{GenerationSpec, InstanceConfig, SpecResolver};
use crate::{Document, DocumentCache, Error, Result};

/// Generation spec held as a typed value.
///
/// This is the backing used when the spec is being edited in memory (or
/// was created on the fly) rather than read from a `.codegen` file.
pub struct LiveSpec {
    spec: GenerationSpec,
    base_dir: PathBuf,
    save_path: Option<PathBuf>,
    provider: Arc<dyn FileProvider>,
    model: DocumentCache,
}

impl LiveSpec {
    pub fn new(
        spec: GenerationSpec,
        base_dir: impl Into<PathBuf>,
        provider: Arc<dyn FileProvider>,
        handler: Arc<dyn ErrorHandler>,
    ) -> Self {
        let model = DocumentCache::new(Arc::clone(&provider), handler);
        Self {
            spec,
            base_dir: base_dir.into(),
            save_path: None,
            provider,
            model,
        }
    }

    /// Where [`SpecResolver::save`] writes the serialized spec.
    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    pub fn spec(&self) -> &GenerationSpec {
        &self.spec
    }

    pub fn spec_mut(&mut self) -> &mut GenerationSpec {
        &mut self.spec
    }
}

impl SpecResolver for LiveSpec {
    fn model_file_name(&mut self) -> Result<Option<String>> {
        Ok(self.spec.model_file.clone())
    }

    fn target_dir_name(&mut self) -> Result<Option<String>> {
        Ok(self.spec.target_dir.clone())
    }

    fn set_model_file_name(&mut self, name: &str) -> Result<()> {
        self.spec.model_file = Some(name.to_string());
        Ok(())
    }

    fn set_target_dir_name(&mut self, name: &str) -> Result<()> {
        self.spec.target_dir = Some(name.to_string());
        Ok(())
    }

    fn spec_document(&mut self) -> Result<Document> {
        let document = self.spec.to_document();
        Ok(match &self.save_path {
            Some(path) => document.with_source(path),
            None => document,
        })
    }

    fn transport_config(&mut self) -> Result<Vec<InstanceConfig>> {
        Ok(self.spec.instances.clone())
    }

    fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn model_cache(&mut self) -> &mut DocumentCache {
        &mut self.model
    }

    fn save(&mut self) -> Result<()> {
        let path = self
            .save_path
            .as_deref()
            .ok_or_else(|| Error::configuration("generation spec has no save location"))?;
        let resource = self.provider.from_workspace(path);
        resource
            .write(&self.spec.to_document().to_xml())
            .map_err(|e| Error::io(resource.path(), e))?;
        tracing::debug!(spec = %resource.path().display(), "saved generation spec");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ddsgen_core::{CollectingErrorHandler, FsFileProvider};
    use tempfile::TempDir;

    use super::*;
    use crate::genspec::DocumentSpec;

    #[test]
    fn test_save_requires_location() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(FsFileProvider::new(temp.path(), temp.path()));
        let handler = Arc::new(CollectingErrorHandler::new());
        let mut spec = LiveSpec::new(GenerationSpec::new("demo.opendds", "gen"), temp.path(), provider, handler);

        let err = spec.save().unwrap_err();
        assert!(matches!(*err, Error::Configuration { .. }));
    }

    #[test]
    fn test_saved_spec_reads_back_as_document() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(FsFileProvider::new(temp.path(), temp.path()));
        let handler = Arc::new(CollectingErrorHandler::new());
        let path = temp.path().join("demo.codegen");

        let mut live = LiveSpec::new(
            GenerationSpec::new("demo.opendds", "gen"),
            temp.path(),
            provider.clone(),
            handler.clone(),
        )
        .with_save_path(&path);
        live.spec_mut().instances.push(InstanceConfig {
            name: "default".to_string(),
            transports: Vec::new(),
        });
        live.save().unwrap();

        let mut raw = DocumentSpec::new(provider, handler, &path);
        assert_eq!(raw.model_file_name().unwrap().as_deref(), Some("demo.opendds"));
        assert_eq!(raw.transport_config().unwrap(), live.transport_config().unwrap());
        assert_eq!(raw.spec_document().unwrap(), live.spec_document().unwrap());
    }
}
