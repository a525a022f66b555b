use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use ddsgen_core::{ErrorHandler, FileProvider, Memo};

use super::{GenerationSpec, InstanceConfig, SpecResolver};
use crate::{Document, DocumentCache, Error, Result};

/// Generation spec backed by the raw `.codegen` document.
///
/// Edits go straight into the parsed tree; [`SpecResolver::save`] writes
/// the tree back to where it was loaded from. A spec file that does not
/// exist yet starts out empty on the first edit.
pub struct DocumentSpec {
    provider: Arc<dyn FileProvider>,
    path: PathBuf,
    base_dir: PathBuf,
    document: Memo<Document>,
    model: DocumentCache,
}

impl DocumentSpec {
    pub fn new(
        provider: Arc<dyn FileProvider>,
        handler: Arc<dyn ErrorHandler>,
        path: impl Into<PathBuf>,
    ) -> Self {
        let path = path.into();
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let model = DocumentCache::new(Arc::clone(&provider), handler);
        Self {
            provider,
            path,
            base_dir,
            document: Memo::new(),
            model,
        }
    }

    /// Location of the spec document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop the parsed spec so the next access reads it again.
    pub fn reload(&mut self) {
        self.document.reset();
    }

    pub fn try_document(&mut self) -> Result<&Document> {
        let provider = self.provider.as_ref();
        let path = &self.path;
        self.document
            .get_or_try_init(|| Document::load(provider, path))
    }

    fn editable(&mut self) -> Result<&mut Document> {
        if !self.document.is_set() {
            let document = match Document::load(self.provider.as_ref(), &self.path) {
                Ok(document) => document,
                Err(err) if matches!(*err, Error::ResourceNotFound { .. }) => {
                    tracing::debug!(spec = %self.path.display(), "starting a new generation spec");
                    Document::new(GenerationSpec::empty_document()).with_source(&self.path)
                }
                Err(err) => return Err(err),
            };
            self.document.set(document);
        }
        self.document
            .get_mut()
            .ok_or_else(|| Error::configuration("generation spec is not loaded"))
    }

    fn name_of(&mut self, local: &str) -> Result<Option<String>> {
        let root = self.try_document()?.root();
        Ok(root
            .child(local)
            .and_then(|e| e.attr("name"))
            .map(str::to_string))
    }

    fn set_name_of(&mut self, local: &str, name: &str) -> Result<()> {
        self.editable()?
            .root_mut()
            .child_or_insert(local)
            .set_attr("name", name);
        Ok(())
    }
}

impl SpecResolver for DocumentSpec {
    fn model_file_name(&mut self) -> Result<Option<String>> {
        self.name_of("source")
    }

    fn target_dir_name(&mut self) -> Result<Option<String>> {
        self.name_of("target")
    }

    fn set_model_file_name(&mut self, name: &str) -> Result<()> {
        self.set_name_of("source", name)
    }

    fn set_target_dir_name(&mut self, name: &str) -> Result<()> {
        self.set_name_of("target", name)
    }

    fn spec_document(&mut self) -> Result<Document> {
        self.try_document().cloned()
    }

    fn transport_config(&mut self) -> Result<Vec<InstanceConfig>> {
        GenerationSpec::from_document(self.try_document()?).map(|spec| spec.instances)
    }

    fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn model_cache(&mut self) -> &mut DocumentCache {
        &mut self.model
    }

    fn save(&mut self) -> Result<()> {
        let xml = self.try_document()?.to_xml();
        let resource = self.provider.from_workspace(&self.path);
        resource
            .write(&xml)
            .map_err(|e| Error::io(resource.path(), e))?;
        tracing::debug!(spec = %resource.path().display(), "saved generation spec");
        Ok(())
    }
}
