//! Generation specs.
//!
//! A generation spec (`*.codegen`) binds a model source to a target
//! directory and carries per-instance transport configuration. It is
//! available either as a raw document ([`DocumentSpec`]) or as a typed
//! value held in memory ([`LiveSpec`]); both answer the same
//! [`SpecResolver`] operations.

mod document;
mod live;

use std::path::{Path, PathBuf};

pub use document::DocumentSpec;
use indexmap::IndexMap;
pub use live::LiveSpec;

use crate::{Document, DocumentCache, Element, Error, ReferenceResolver, Result};

/// Namespace of the generation spec root element.
pub const GENERATOR_NS: &str = "http://www.opendds.org/modeling/schemas/Generator/1.0";

/// Qualified name of the generation spec root element.
pub const ROOT_ELEMENT: &str = "generator:CodeGen";

/// Resolve a spec-relative name against the spec's directory.
pub fn resolve_name(base: &Path, name: &str) -> PathBuf {
    let path = Path::new(name);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Typed content of a generation spec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSpec {
    /// Model file name, relative to the spec's directory.
    pub model_file: Option<String>,
    /// Target directory name, relative to the spec's directory.
    pub target_dir: Option<String>,
    pub instances: Vec<InstanceConfig>,
}

/// Transport settings for one deployed application instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceConfig {
    pub name: String,
    pub transports: Vec<TransportConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportConfig {
    /// Index referenced by `transportId` attributes in the model.
    pub index: u32,
    /// Transport type (`tcp`, `udp`, `multicast`, ...), empty when unset.
    pub kind: String,
    pub options: IndexMap<String, String>,
}

impl GenerationSpec {
    pub fn new(model_file: impl Into<String>, target_dir: impl Into<String>) -> Self {
        Self {
            model_file: Some(model_file.into()),
            target_dir: Some(target_dir.into()),
            instances: Vec::new(),
        }
    }

    /// An empty spec document.
    pub fn empty_document() -> Element {
        Element::new(ROOT_ELEMENT).with_attr("xmlns:generator", GENERATOR_NS)
    }

    /// Serialize into the `.codegen` document shape.
    pub fn to_document(&self) -> Document {
        let mut root = Self::empty_document();
        if let Some(model) = &self.model_file {
            root.push(Element::new("source").with_attr("name", model));
        }
        if let Some(target) = &self.target_dir {
            root.push(Element::new("target").with_attr("name", target));
        }
        if !self.instances.is_empty() {
            let mut instances = Element::new("instances");
            for instance in &self.instances {
                let mut element = Element::new("instance").with_attr("name", &instance.name);
                for transport in &instance.transports {
                    let mut t = Element::new("transport")
                        .with_attr("transportIndex", transport.index.to_string());
                    if !transport.kind.is_empty() {
                        let mut config = Element::new(&transport.kind);
                        for (key, value) in &transport.options {
                            config.set_attr(key, value);
                        }
                        t.push(config);
                    }
                    element.push(t);
                }
                instances.push(element);
            }
            root.push(instances);
        }
        Document::new(root)
    }

    /// Read the typed content of a `.codegen` document.
    pub fn from_document(doc: &Document) -> Result<Self> {
        let root = doc.root();
        let name_of = |local: &str| {
            root.child(local)
                .and_then(|e| e.attr("name"))
                .map(str::to_string)
        };

        let mut instances = Vec::new();
        for element in root.children_named("instances").flat_map(|e| e.children_named("instance")) {
            let mut transports = Vec::new();
            for t in element.children_named("transport") {
                let raw = t.attr("transportIndex").unwrap_or("0");
                let index = raw.parse().map_err(|_| {
                    Error::configuration(format!("invalid transport index '{raw}'"))
                })?;
                let (kind, options) = match t.children().next() {
                    Some(config) => (
                        config.local_name().to_string(),
                        config
                            .attributes()
                            .iter()
                            .map(|(k, v)| (k.clone(), v.clone()))
                            .collect(),
                    ),
                    None => (String::new(), IndexMap::new()),
                };
                transports.push(TransportConfig {
                    index,
                    kind,
                    options,
                });
            }
            instances.push(InstanceConfig {
                name: element.attr("name").unwrap_or_default().to_string(),
                transports,
            });
        }

        Ok(Self {
            model_file: name_of("source"),
            target_dir: name_of("target"),
            instances,
        })
    }
}

/// Access to a generation spec and the model it points at.
pub trait SpecResolver {
    /// Model file name as written in the spec.
    fn model_file_name(&mut self) -> Result<Option<String>>;

    /// Target directory name as written in the spec.
    fn target_dir_name(&mut self) -> Result<Option<String>>;

    fn set_model_file_name(&mut self, name: &str) -> Result<()>;

    fn set_target_dir_name(&mut self, name: &str) -> Result<()>;

    /// The spec itself as a document.
    fn spec_document(&mut self) -> Result<Document>;

    /// Per-instance transport configuration.
    fn transport_config(&mut self) -> Result<Vec<InstanceConfig>>;

    /// Directory relative names resolve against.
    fn base_dir(&self) -> &Path;

    /// Cache holding the model document.
    fn model_cache(&mut self) -> &mut DocumentCache;

    /// Persist the spec.
    fn save(&mut self) -> Result<()>;

    fn model_path(&mut self) -> Result<PathBuf> {
        let name = self
            .model_file_name()?
            .ok_or_else(|| Error::configuration("generation spec names no model source"))?;
        Ok(resolve_name(self.base_dir(), &name))
    }

    fn target_path(&mut self) -> Result<PathBuf> {
        let name = self
            .target_dir_name()?
            .ok_or_else(|| Error::configuration("generation spec names no target directory"))?;
        Ok(resolve_name(self.base_dir(), &name))
    }

    /// The model cache, pointed at the spec's current model path.
    fn model(&mut self) -> Result<&mut DocumentCache> {
        let path = self.model_path()?;
        let cache = self.model_cache();
        cache.set_source(path);
        Ok(cache)
    }

    fn try_model_name(&mut self) -> Result<String> {
        self.model()?.try_model_name()
    }

    /// The model's name, or `None` after reporting why it is unavailable.
    fn model_name(&mut self) -> Option<String> {
        match self.model() {
            Ok(cache) => cache.model_name(),
            Err(err) => {
                self.model_cache().report("Model name", &err);
                None
            }
        }
    }

    /// Input document for a transformation.
    ///
    /// With a resolver this is the model with its references inlined;
    /// without one it is the spec document itself.
    fn source(&mut self, resolver: Option<&dyn ReferenceResolver>) -> Result<Document> {
        match resolver {
            Some(resolver) => {
                let raw = self.model()?.try_document()?;
                resolver.resolve(&raw)
            }
            None => self.spec_document(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use ddsgen_core::{CollectingErrorHandler, FsFileProvider};
    use tempfile::TempDir;

    use super::*;

    const SPEC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<generator:CodeGen xmlns:generator="http://www.opendds.org/modeling/schemas/Generator/1.0">
  <source name="demo.opendds"/>
  <target name="../gen"/>
  <instances>
    <instance name="default">
      <transport transportIndex="1">
        <tcp local_address="localhost:0"/>
      </transport>
      <transport transportIndex="3"/>
    </instance>
  </instances>
</generator:CodeGen>
"#;

    #[test]
    fn test_resolve_name() {
        let base = Path::new("/work/models");
        assert_eq!(resolve_name(base, "demo.opendds"), base.join("demo.opendds"));
        assert_eq!(resolve_name(base, "/abs/gen"), PathBuf::from("/abs/gen"));
    }

    #[test]
    fn test_from_document() {
        let doc = Document::parse(SPEC, "demo.codegen").unwrap();
        let spec = GenerationSpec::from_document(&doc).unwrap();

        assert_eq!(spec.model_file.as_deref(), Some("demo.opendds"));
        assert_eq!(spec.target_dir.as_deref(), Some("../gen"));
        assert_eq!(spec.instances.len(), 1);

        let transports = &spec.instances[0].transports;
        assert_eq!(transports[0].index, 1);
        assert_eq!(transports[0].kind, "tcp");
        assert_eq!(transports[0].options["local_address"], "localhost:0");
        assert_eq!(transports[1].index, 3);
        assert!(transports[1].kind.is_empty());
    }

    #[test]
    fn test_document_shape_survives_typed_view() {
        let doc = Document::parse(SPEC, "demo.codegen").unwrap();
        let spec = GenerationSpec::from_document(&doc).unwrap();

        assert_eq!(spec.to_document().root(), doc.root());
    }

    #[test]
    fn test_invalid_transport_index() {
        let doc = Document::parse(
            r#"<generator:CodeGen><instances><instance name="a"><transport transportIndex="x"/></instance></instances></generator:CodeGen>"#,
            "bad.codegen",
        )
        .unwrap();
        let err = GenerationSpec::from_document(&doc).unwrap_err();
        assert!(matches!(*err, Error::Configuration { .. }));
    }

    #[test]
    fn test_backings_are_equivalent() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(FsFileProvider::new(temp.path(), temp.path()));
        let handler = Arc::new(CollectingErrorHandler::new());

        let mut raw = DocumentSpec::new(
            provider.clone(),
            handler.clone(),
            temp.path().join("demo.codegen"),
        );
        let mut live = LiveSpec::new(
            GenerationSpec::default(),
            temp.path(),
            provider,
            handler,
        );

        for spec in [&mut raw as &mut dyn SpecResolver, &mut live] {
            spec.set_model_file_name("demo.opendds").unwrap();
            spec.set_target_dir_name("gen").unwrap();
        }

        assert_eq!(
            raw.spec_document().unwrap().root(),
            live.spec_document().unwrap().root()
        );
        assert_eq!(raw.model_path().unwrap(), live.model_path().unwrap());
        assert_eq!(raw.target_path().unwrap(), temp.path().join("gen"));
    }

    #[test]
    fn test_source_with_and_without_resolver() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("demo.codegen"), SPEC).unwrap();
        fs::write(
            temp.path().join("demo.opendds"),
            r#"<opendds:OpenDDSModel name="Demo"/>"#,
        )
        .unwrap();
        let provider = Arc::new(FsFileProvider::new(temp.path(), temp.path()));
        let handler = Arc::new(CollectingErrorHandler::new());
        let mut spec = DocumentSpec::new(
            provider.clone(),
            handler,
            temp.path().join("demo.codegen"),
        );

        let unresolved = spec.source(None).unwrap();
        assert_eq!(unresolved.root().local_name(), "CodeGen");

        let resolver = crate::XmlReferenceResolver::new(provider);
        let resolved = spec.source(Some(&resolver)).unwrap();
        assert_eq!(resolved.root().attr("name"), Some("Demo"));
        assert_eq!(spec.model_name().as_deref(), Some("Demo"));
    }

    #[test]
    fn test_model_name_without_model_source_is_reported() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(FsFileProvider::new(temp.path(), temp.path()));
        let handler = Arc::new(CollectingErrorHandler::new());
        let mut spec = LiveSpec::new(
            GenerationSpec::default(),
            temp.path(),
            provider,
            handler.clone(),
        );

        assert_eq!(spec.model_name(), None);
        assert_eq!(handler.error_count(), 1);
    }
}
