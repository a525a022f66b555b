//! Per-source document cache.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use ddsgen_core::{ErrorHandler, FileProvider, Memo};

use crate::{Document, Error, Result, query};

/// Loads, parses and caches one model document.
///
/// The parsed tree and every value derived from it are dropped when the
/// source path changes, and re-read when the file's timestamp advances.
/// The `try_*` accessors return errors to the caller; the plain accessors
/// report them through the error handler and return no value.
pub struct DocumentCache {
    provider: Arc<dyn FileProvider>,
    handler: Arc<dyn ErrorHandler>,
    source: Option<PathBuf>,
    modified: Option<SystemTime>,
    document: Memo<Arc<Document>>,
    name: Memo<String>,
    transport_ids: Memo<BTreeSet<String>>,
    data_library: Memo<bool>,
}

impl DocumentCache {
    pub fn new(provider: Arc<dyn FileProvider>, handler: Arc<dyn ErrorHandler>) -> Self {
        Self {
            provider,
            handler,
            source: None,
            modified: None,
            document: Memo::new(),
            name: Memo::new(),
            transport_ids: Memo::new(),
            data_library: Memo::new(),
        }
    }

    /// Point the cache at a source path.
    ///
    /// A different path discards everything cached; the same path is a no-op.
    pub fn set_source(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if self.source.as_deref() == Some(path) {
            return;
        }
        tracing::debug!(source = %path.display(), "model source changed");
        self.source = Some(path.to_path_buf());
        self.invalidate();
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Timestamp of the source when it was last parsed.
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Drop the parsed tree and all derived values.
    pub fn invalidate(&mut self) {
        self.document.reset();
        self.name.reset();
        self.transport_ids.reset();
        self.data_library.reset();
        self.modified = None;
    }

    /// Whether the source changed on disk since it was parsed.
    pub fn is_stale(&self) -> bool {
        let Some(source) = &self.source else {
            return false;
        };
        match (self.modified, self.provider.from_workspace(source).modified()) {
            (Some(parsed), Some(current)) => current > parsed,
            _ => false,
        }
    }

    pub fn try_document(&mut self) -> Result<Arc<Document>> {
        if self.document.is_set() && self.is_stale() {
            tracing::debug!("model source modified on disk, re-parsing");
            self.invalidate();
        }

        let provider = self.provider.as_ref();
        let source = self.source.as_deref();
        let modified = &mut self.modified;
        let document = self.document.get_or_try_init(|| {
            let source = source.ok_or_else(|| Error::configuration("no model source configured"))?;
            let resource = provider.from_workspace(source);
            let document = Document::load_resource(&resource)?;
            *modified = resource.modified();
            tracing::debug!(source = %source.display(), "parsed model document");
            Ok::<_, Box<Error>>(Arc::new(document))
        })?;
        Ok(Arc::clone(document))
    }

    /// The parsed document, or `None` after reporting why it is unavailable.
    pub fn document(&mut self) -> Option<Arc<Document>> {
        self.try_document()
            .map_err(|err| self.report("Load model", &err))
            .ok()
    }

    pub fn try_model_name(&mut self) -> Result<String> {
        let document = self.try_document()?;
        self.name
            .get_or_try_init(|| query::model_name(&document))
            .cloned()
    }

    /// The model's name; missing or ambiguous names are reported.
    pub fn model_name(&mut self) -> Option<String> {
        self.try_model_name()
            .map_err(|err| self.report("Model name", &err))
            .ok()
    }

    pub fn try_transport_ids(&mut self) -> Result<BTreeSet<String>> {
        let document = self.try_document()?;
        Ok(self
            .transport_ids
            .get_or_init(|| query::transport_ids(&document))
            .clone())
    }

    /// Transport identifiers, empty when the document cannot be loaded.
    pub fn transport_ids(&mut self) -> BTreeSet<String> {
        self.try_transport_ids()
            .map_err(|err| self.report("Transport identifiers", &err))
            .unwrap_or_default()
    }

    pub fn try_has_data_library(&mut self) -> Result<bool> {
        let document = self.try_document()?;
        Ok(*self
            .data_library
            .get_or_init(|| query::has_data_library(&document)))
    }

    /// Whether a data library is declared; false when the document is unavailable.
    pub fn has_data_library(&mut self) -> bool {
        self.try_has_data_library()
            .map_err(|err| self.report("Data library", &err))
            .unwrap_or(false)
    }

    /// Report an error through this cache's handler at its own severity.
    pub fn report(&self, title: &str, err: &Error) {
        self.handler
            .report(err.severity(), title, &err.to_string(), Some(err));
    }
}
