//! Reference resolution pass.
//!
//! Model documents may point into other documents with
//! `href="<location>#<fragment>"`. This pass produces a self-contained
//! tree in which every such element has been replaced by the element it
//! references, so templates never need to follow links themselves.

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
};

use ddsgen_core::FileProvider;
use regex::Regex;

use crate::{Document, Element, Error, Node, Result};

/// Name the pass reports its failures under.
pub const RESOLVE_TRANSFORM: &str = "ResolvedModel";

const HREF: &str = "href";

/// `${VAR}` or `$(VAR)` in a reference location.
static SEARCH_PATH_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]*)\}|\$\(([^)]*)\)").expect("search-path pattern is valid")
});

/// Turns a raw model document into a self-contained one.
pub trait ReferenceResolver {
    fn resolve(&self, raw: &Document) -> Result<Document>;
}

/// Resolver for EMF-style `href` references.
///
/// The location part may contain `${VAR}` or `$(VAR)` search-path
/// variables; unknown variables fall back to the process environment.
/// The fragment is empty (document root) or a path such as
/// `//@libs.0/@types.1` selecting children by name and index.
pub struct XmlReferenceResolver {
    provider: Arc<dyn FileProvider>,
    variables: BTreeMap<String, String>,
}

impl XmlReferenceResolver {
    pub fn new(provider: Arc<dyn FileProvider>) -> Self {
        Self {
            provider,
            variables: BTreeMap::new(),
        }
    }

    /// Builder-style search-path variables.
    pub fn with_variables(
        mut self,
        variables: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.variables.extend(variables);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Substitute search-path variables in a reference location.
    pub fn expand(&self, location: &str) -> Result<String> {
        let mut out = String::with_capacity(location.len());
        let mut last = 0;

        for caps in SEARCH_PATH_VAR.captures_iter(location) {
            let Some(whole) = caps.get(0) else { continue };
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            out.push_str(literal(location, &location[last..whole.start()])?);
            out.push_str(&self.lookup(name)?);
            last = whole.end();
        }

        out.push_str(literal(location, &location[last..])?);
        Ok(out)
    }

    fn lookup(&self, name: &str) -> Result<String> {
        self.variables
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
            .ok_or_else(|| {
                Error::transformation(
                    RESOLVE_TRANSFORM,
                    format!("undefined search-path variable '{name}'"),
                )
            })
    }
}

/// Text between variables; an opening `${` or `$(` here was never closed.
fn literal<'a>(location: &str, text: &'a str) -> Result<&'a str> {
    if text.contains("${") || text.contains("$(") {
        return Err(Error::transformation(
            RESOLVE_TRANSFORM,
            format!("unterminated variable in '{location}'"),
        ));
    }
    Ok(text)
}

impl ReferenceResolver for XmlReferenceResolver {
    fn resolve(&self, raw: &Document) -> Result<Document> {
        let source = raw.source().map(Path::to_path_buf).unwrap_or_default();
        let mut session = Session {
            resolver: self,
            loaded: HashMap::new(),
            visiting: Vec::new(),
        };
        let root = session.resolve_element(raw.root(), raw.root(), &source)?;
        tracing::debug!(
            source = %source.display(),
            documents = session.loaded.len(),
            "resolved model references"
        );

        let resolved = Document::new(root);
        Ok(match raw.source() {
            Some(path) => resolved.with_source(path),
            None => resolved,
        })
    }
}

/// State for one resolution run.
struct Session<'r> {
    resolver: &'r XmlReferenceResolver,
    loaded: HashMap<PathBuf, Arc<Document>>,
    visiting: Vec<(PathBuf, String)>,
}

impl Session<'_> {
    fn resolve_element(&mut self, element: &Element, root: &Element, path: &Path) -> Result<Element> {
        let mut out = element.shallow_clone();
        for node in element.nodes() {
            match node {
                Node::Text(text) => out.push_node(Node::Text(text.clone())),
                Node::Element(child) => {
                    let resolved = match child.attr(HREF) {
                        Some(href) => self.inline(child, href, root, path)?,
                        None => self.resolve_element(child, root, path)?,
                    };
                    out.push(resolved);
                }
            }
        }
        Ok(out)
    }

    fn inline(
        &mut self,
        referrer: &Element,
        href: &str,
        root: &Element,
        path: &Path,
    ) -> Result<Element> {
        let (location, fragment) = href.split_once('#').unwrap_or((href, ""));
        let location = self.resolver.expand(location)?;

        let (target_path, target_doc) = if location.is_empty() {
            (path.to_path_buf(), None)
        } else {
            let target_path = resolve_location(path, &location);
            let doc = self.load(&target_path)?;
            (target_path, Some(doc))
        };

        let key = (target_path.clone(), fragment.to_string());
        if self.visiting.contains(&key) {
            return Err(Error::transformation(
                RESOLVE_TRANSFORM,
                format!("circular reference through '{href}'"),
            ));
        }

        let target_root = target_doc.as_ref().map_or(root, |d| d.root());
        let target = select(target_root, fragment, href)?;

        self.visiting.push(key);
        let resolved = self.resolve_element(target, target_root, &target_path);
        self.visiting.pop();
        let resolved = resolved?;

        // Referring attributes survive; the referenced element wins on conflict.
        let mut merged = Element::new(referrer.name());
        for (name, value) in referrer.attributes() {
            if name != HREF {
                merged.set_attr(name.clone(), value.clone());
            }
        }
        for (name, value) in resolved.attributes() {
            if !name.starts_with("xmlns") {
                merged.set_attr(name.clone(), value.clone());
            }
        }
        merged.set_nodes(resolved.into_nodes());
        Ok(merged)
    }

    fn load(&mut self, path: &Path) -> Result<Arc<Document>> {
        if let Some(doc) = self.loaded.get(path) {
            return Ok(Arc::clone(doc));
        }
        let doc = Arc::new(Document::load(self.resolver.provider.as_ref(), path)?);
        self.loaded.insert(path.to_path_buf(), Arc::clone(&doc));
        Ok(doc)
    }
}

fn resolve_location(referrer: &Path, location: &str) -> PathBuf {
    let location = Path::new(location);
    if location.is_absolute() {
        return location.to_path_buf();
    }
    match referrer.parent() {
        Some(dir) => dir.join(location),
        None => location.to_path_buf(),
    }
}

fn select<'a>(root: &'a Element, fragment: &str, href: &str) -> Result<&'a Element> {
    let steps = fragment.trim_start_matches('/');
    if steps.is_empty() {
        return Ok(root);
    }

    let unresolved = || {
        Error::transformation(
            RESOLVE_TRANSFORM,
            format!("reference '{href}' does not resolve to an element"),
        )
    };

    let mut current = root;
    for step in steps.split('/') {
        let step = step.strip_prefix('@').ok_or_else(unresolved)?;
        let (name, index) = match step.rsplit_once('.') {
            Some((name, index)) => (name, index.parse::<usize>().map_err(|_| unresolved())?),
            None => (step, 0),
        };
        current = current.children_named(name).nth(index).ok_or_else(unresolved)?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use ddsgen_core::FsFileProvider;
    use tempfile::TempDir;

    use super::*;

    const SHARED: &str = r#"<opendds:OpenDDSModel name="Shared">
  <libs xsi:type="types:DataLib" name="SharedTypes">
    <types xsi:type="types:Struct" name="Message">
      <fields name="id" type="long"/>
    </types>
  </libs>
  <libs xsi:type="types:DataLib" name="MoreTypes">
    <types xsi:type="types:Struct" name="Extra"/>
  </libs>
</opendds:OpenDDSModel>"#;

    fn setup() -> (TempDir, XmlReferenceResolver) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("shared")).unwrap();
        fs::write(temp.path().join("shared/common.opendds"), SHARED).unwrap();
        let provider = Arc::new(FsFileProvider::new(temp.path(), temp.path()));
        let resolver = XmlReferenceResolver::new(provider);
        (temp, resolver)
    }

    fn model(temp: &TempDir, body: &str) -> Document {
        let path = temp.path().join("demo.opendds");
        let src = format!(r#"<opendds:OpenDDSModel name="Demo">{body}</opendds:OpenDDSModel>"#);
        fs::write(&path, &src).unwrap();
        Document::parse(&src, &path).unwrap()
    }

    #[test]
    fn test_inlines_relative_reference() {
        let (temp, resolver) = setup();
        let raw = model(
            &temp,
            r#"<libs xsi:type="types:DataLib" href="shared/common.opendds#//@libs.0"/>"#,
        );

        let resolved = resolver.resolve(&raw).unwrap();
        let lib = resolved.root().child("libs").unwrap();

        assert_eq!(lib.attr("name"), Some("SharedTypes"));
        assert_eq!(lib.attr("href"), None);
        assert_eq!(lib.xsi_type(), Some("DataLib"));
        assert_eq!(lib.child("types").unwrap().attr("name"), Some("Message"));
        assert_eq!(resolved.source(), raw.source());
    }

    #[test]
    fn test_indexed_fragment() {
        let (temp, resolver) = setup();
        let raw = model(
            &temp,
            r#"<libs href="shared/common.opendds#//@libs.1/@types.0"/>"#,
        );

        let resolved = resolver.resolve(&raw).unwrap();
        assert_eq!(
            resolved.root().child("libs").unwrap().attr("name"),
            Some("Extra")
        );
    }

    #[test]
    fn test_search_path_variable() {
        let (temp, resolver) = setup();
        let resolver = resolver.with_variable("SHARED", temp.path().join("shared").display().to_string());
        let raw = model(&temp, r#"<libs href="${SHARED}/common.opendds#//@libs.0"/>"#);

        let resolved = resolver.resolve(&raw).unwrap();
        assert_eq!(
            resolved.root().child("libs").unwrap().attr("name"),
            Some("SharedTypes")
        );
    }

    #[test]
    fn test_expand_forms() {
        let (_temp, resolver) = setup();
        let resolver = resolver.with_variable("ROOT", "/opt/dds");

        assert_eq!(resolver.expand("$(ROOT)/a").unwrap(), "/opt/dds/a");
        assert_eq!(resolver.expand("${ROOT}/a").unwrap(), "/opt/dds/a");
        assert_eq!(resolver.expand("cost$5").unwrap(), "cost$5");
        assert!(resolver.expand("${DDSGEN_SURELY_UNDEFINED_VAR}").is_err());
        assert!(resolver.expand("${ROOT").is_err());
        assert!(resolver.expand("${ROOT}/$(ROOT").is_err());
        assert_eq!(
            resolver.expand("${ROOT}/x/$(ROOT)").unwrap(),
            "/opt/dds/x//opt/dds"
        );
    }

    #[test]
    fn test_missing_target_document() {
        let (temp, resolver) = setup();
        let raw = model(&temp, r#"<libs href="nowhere.opendds#//@libs.0"/>"#);

        let err = resolver.resolve(&raw).unwrap_err();
        assert!(matches!(*err, Error::ResourceNotFound { .. }));
    }

    #[test]
    fn test_bad_fragment() {
        let (temp, resolver) = setup();
        let raw = model(&temp, r#"<libs href="shared/common.opendds#//@libs.7"/>"#);

        let err = resolver.resolve(&raw).unwrap_err();
        assert!(matches!(*err, Error::Transformation { .. }));
    }

    #[test]
    fn test_circular_reference() {
        let (temp, resolver) = setup();
        let raw = model(&temp, r##"<libs name="Loop"><inner href="#//@libs.0"/></libs>"##);

        let err = resolver.resolve(&raw).unwrap_err();
        assert!(err.to_string().contains("circular reference"));
    }

    #[test]
    fn test_document_without_references_is_unchanged() {
        let (temp, resolver) = setup();
        let raw = model(&temp, r#"<libs xsi:type="types:DataLib" name="Local"/>"#);

        let resolved = resolver.resolve(&raw).unwrap();
        assert_eq!(resolved, raw);
    }
}
