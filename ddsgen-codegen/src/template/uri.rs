use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use ddsgen_core::{FileProvider, Resource};
use ddsgen_model::{Error, Result};

/// Locates documents and templates referenced from inside a template.
///
/// A name ending in the model extension is read from the model's
/// directory, any other relative name from the template bundle. Absolute
/// paths are used as they are.
#[derive(Clone)]
pub struct UriResolver {
    provider: Arc<dyn FileProvider>,
    model_dir: Option<PathBuf>,
    model_extension: String,
}

impl UriResolver {
    pub fn new(provider: Arc<dyn FileProvider>, model_extension: impl Into<String>) -> Self {
        Self {
            provider,
            model_dir: None,
            model_extension: model_extension.into(),
        }
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(dir.into());
        self
    }

    pub fn model_dir(&self) -> Option<&Path> {
        self.model_dir.as_deref()
    }

    fn is_model_name(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .is_some_and(|ext| ext == self.model_extension.as_str())
    }

    pub fn resolve(&self, name: &str) -> Resource {
        let path = Path::new(name);
        if path.is_absolute() {
            Resource::new(path)
        } else if self.is_model_name(name) {
            match &self.model_dir {
                Some(dir) => self.provider.from_workspace(&dir.join(path)),
                None => self.provider.from_workspace(path),
            }
        } else {
            self.provider.from_bundle(path)
        }
    }

    /// Resolve and read a referenced file.
    pub fn read(&self, name: &str) -> Result<(Resource, String)> {
        let resource = self.resolve(name);
        if !resource.exists() {
            return Err(Error::not_found(resource.path()));
        }
        let content = resource
            .read_to_string()
            .map_err(|e| Error::io(resource.path(), e))?;
        Ok((resource, content))
    }
}

#[cfg(test)]
mod tests {
    use ddsgen_core::FsFileProvider;

    use super::*;

    fn resolver() -> UriResolver {
        let provider = Arc::new(FsFileProvider::new("/work", "/bundle"));
        UriResolver::new(provider, "opendds").with_model_dir("/work/models")
    }

    #[test]
    fn test_model_names_resolve_against_model_dir() {
        assert_eq!(
            resolver().resolve("shared.opendds").path(),
            Path::new("/work/models/shared.opendds")
        );
        assert_eq!(
            resolver().resolve("../common/types.opendds").path(),
            Path::new("/work/models/../common/types.opendds")
        );
    }

    #[test]
    fn test_other_names_resolve_against_bundle() {
        assert_eq!(
            resolver().resolve("common.tera").path(),
            Path::new("/bundle/common.tera")
        );
        assert_eq!(
            resolver().resolve("lib/opendds.tera").path(),
            Path::new("/bundle/lib/opendds.tera")
        );
    }

    #[test]
    fn test_absolute_names_are_verbatim() {
        assert_eq!(
            resolver().resolve("/etc/ddsgen/extra.tera").path(),
            Path::new("/etc/ddsgen/extra.tera")
        );
        assert_eq!(
            resolver().resolve("/srv/model.opendds").path(),
            Path::new("/srv/model.opendds")
        );
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let err = resolver().read("missing.tera").unwrap_err();
        assert!(matches!(*err, Error::ResourceNotFound { .. }));
    }
}
