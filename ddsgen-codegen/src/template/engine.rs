use std::{
    collections::{BTreeSet, HashMap},
    sync::LazyLock,
};

use ddsgen_core::{Resource, WriteResult};
use ddsgen_model::{Error, Result};
use regex::Regex;
use tera::{Context, Tera};

use super::{
    UriResolver,
    filters::{self, DocumentFunction},
};
use crate::TransformKind;

/// `{% include "x" %}`, `{% import "x" as m %}` and `{% extends "x" %}`.
static TEMPLATE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{%-?\s*(?:include|import|extends)\s+["']([^"']+)["']"#)
        .expect("template reference pattern is valid")
});

/// Names of the templates a template source refers to.
pub fn template_refs(source: &str) -> BTreeSet<String> {
    TEMPLATE_REF
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// A template program with everything it includes.
pub struct CompiledTemplate {
    entry: String,
    tera: Tera,
}

impl CompiledTemplate {
    /// Name of the entry template.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Names of every template loaded for this program.
    pub fn templates(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }
}

/// Compiled templates, one per transformation kind.
#[derive(Default)]
pub struct TemplateCache {
    entries: HashMap<TransformKind, CompiledTemplate>,
    reload: bool,
    compilations: usize,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompile on every use instead of reusing cached programs.
    pub fn set_reload(&mut self, reload: bool) {
        self.reload = reload;
    }

    pub fn reload(&self) -> bool {
        self.reload
    }

    pub fn contains(&self, kind: TransformKind) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn get(&self, kind: TransformKind) -> Option<&CompiledTemplate> {
        self.entries.get(&kind)
    }

    /// Drop every compiled program.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }

    /// Number of compilations performed so far.
    pub fn compilations(&self) -> usize {
        self.compilations
    }

    fn needs_compile(&self, kind: TransformKind) -> bool {
        self.reload || !self.entries.contains_key(&kind)
    }
}

/// Runs template programs against documents.
#[derive(Default)]
pub struct TemplateEngine {
    cache: TemplateCache,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reload(mut self, reload: bool) -> Self {
        self.cache.set_reload(reload);
        self
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TemplateCache {
        &mut self.cache
    }

    /// Render the template for `kind` with `context`.
    ///
    /// The program is compiled from `template` on first use (or on every
    /// use while reload is active). Includes are located through `uri`,
    /// which also backs the `document()` function during rendering.
    pub fn render(
        &mut self,
        kind: TransformKind,
        template: &str,
        context: &Context,
        uri: &UriResolver,
    ) -> Result<String> {
        if self.cache.needs_compile(kind) {
            let compiled = compile(kind, template, uri)?;
            self.cache.entries.insert(kind, compiled);
            self.cache.compilations += 1;
        } else {
            tracing::debug!(kind = %kind, "template cache hit");
        }

        let compiled = self
            .cache
            .entries
            .get_mut(&kind)
            .ok_or_else(|| Error::configuration(format!("no compiled template for {kind}")))?;
        compiled
            .tera
            .register_function("document", DocumentFunction::new(uri.clone()));
        compiled
            .tera
            .render(&compiled.entry, context)
            .map_err(|e| Error::transformation_caused_by(kind.label(), render_message(&e), e))
    }

    /// Render and write the result to `sink`.
    ///
    /// Nothing is written when rendering fails.
    pub fn apply(
        &mut self,
        kind: TransformKind,
        template: &str,
        context: &Context,
        uri: &UriResolver,
        sink: &Resource,
    ) -> Result<WriteResult> {
        let rendered = self.render(kind, template, context, uri)?;
        sink.write(&rendered).map_err(|e| Error::io(sink.path(), e))
    }
}

fn compile(kind: TransformKind, entry: &str, uri: &UriResolver) -> Result<CompiledTemplate> {
    let mut sources: Vec<(String, String)> = Vec::new();
    let mut seen = BTreeSet::new();
    let mut pending = vec![entry.to_string()];

    while let Some(name) = pending.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }
        let (resource, source) = uri.read(&name)?;
        tracing::debug!(template = %name, path = %resource.path().display(), "loaded template");
        pending.extend(template_refs(&source));
        sources.push((name, source));
    }

    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    filters::register(&mut tera);
    tera.add_raw_templates(sources).map_err(|e| {
        Error::transformation_caused_by(
            kind.label(),
            format!("template '{entry}' does not compile"),
            e,
        )
    })?;

    tracing::debug!(kind = %kind, template = entry, "compiled template");
    Ok(CompiledTemplate {
        entry: entry.to_string(),
        tera,
    })
}

/// Innermost message of a tera error, which names the failing expression.
fn render_message(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        message = inner.to_string();
        source = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use ddsgen_core::FsFileProvider;
    use tempfile::TempDir;

    use super::*;

    struct Fixture {
        temp: TempDir,
        uri: UriResolver,
    }

    fn fixture(templates: &[(&str, &str)]) -> Fixture {
        let temp = TempDir::new().unwrap();
        let bundle = temp.path().join("bundle");
        fs::create_dir_all(&bundle).unwrap();
        fs::create_dir_all(temp.path().join("models")).unwrap();
        for (name, source) in templates {
            fs::write(bundle.join(name), source).unwrap();
        }
        let provider = Arc::new(FsFileProvider::new(temp.path(), &bundle));
        let uri = UriResolver::new(provider, "opendds").with_model_dir(temp.path().join("models"));
        Fixture { temp, uri }
    }

    fn context(name: &str) -> Context {
        let mut context = Context::new();
        context.insert("model_name", name);
        context
    }

    #[test]
    fn test_template_refs() {
        let refs = template_refs(
            r#"{% extends "base.tera" %}
{%- include 'common.tera' %}
{% import "macros.tera" as m %}
{{ "include" }}"#,
        );
        let refs: Vec<_> = refs.into_iter().collect();
        assert_eq!(refs, vec!["base.tera", "common.tera", "macros.tera"]);
    }

    #[test]
    fn test_renders_with_includes() {
        let f = fixture(&[
            ("main.tera", r#"{% include "header.tera" %}body of {{ model_name }}"#),
            ("header.tera", "// generated\n"),
        ]);
        let mut engine = TemplateEngine::new();

        let out = engine
            .render(TransformKind::InterfaceDefinition, "main.tera", &context("Demo"), &f.uri)
            .unwrap();

        insta::assert_snapshot!(out, @r"
        // generated
        body of Demo
        ");
        let compiled = engine.cache().get(TransformKind::InterfaceDefinition).unwrap();
        assert_eq!(compiled.entry(), "main.tera");
        assert_eq!(compiled.templates(), vec!["header.tera", "main.tera"]);
    }

    #[test]
    fn test_extends_and_macros() {
        let f = fixture(&[
            (
                "child.tera",
                r#"{% extends "base.tera" %}
{% import "macros.tera" as m %}
{% block body %}{{ m::greet(who=model_name) }}{% endblock body %}"#,
            ),
            ("base.tera", "[{% block body %}{% endblock body %}]"),
            ("macros.tera", r#"{% macro greet(who) %}hello {{ who }}{% endmacro greet %}"#),
        ]);
        let mut engine = TemplateEngine::new();

        let out = engine
            .render(TransformKind::HeaderBody, "child.tera", &context("Demo"), &f.uri)
            .unwrap();
        assert_eq!(out, "[hello Demo]");
    }

    #[test]
    fn test_model_relative_include() {
        let f = fixture(&[("main.tera", r#"{% include "banner.opendds" %}"#)]);
        fs::write(f.temp.path().join("models/banner.opendds"), "model banner").unwrap();
        let mut engine = TemplateEngine::new();

        let out = engine
            .render(TransformKind::BuildProjectDescriptor, "main.tera", &context("Demo"), &f.uri)
            .unwrap();
        assert_eq!(out, "model banner");
    }

    #[test]
    fn test_cache_and_reload() {
        let f = fixture(&[("main.tera", "v1")]);
        let mut engine = TemplateEngine::new();
        let kind = TransformKind::BuildBaseDescriptor;

        engine.render(kind, "main.tera", &context("Demo"), &f.uri).unwrap();
        fs::write(f.temp.path().join("bundle/main.tera"), "v2").unwrap();
        let cached = engine.render(kind, "main.tera", &context("Demo"), &f.uri).unwrap();
        assert_eq!(cached, "v1");
        assert_eq!(engine.cache().compilations(), 1);

        engine.cache_mut().set_reload(true);
        let reloaded = engine.render(kind, "main.tera", &context("Demo"), &f.uri).unwrap();
        assert_eq!(reloaded, "v2");
        assert_eq!(engine.cache().compilations(), 2);

        engine.cache_mut().set_reload(false);
        engine.cache_mut().invalidate();
        assert!(!engine.cache().contains(kind));
    }

    #[test]
    fn test_missing_include_is_not_found() {
        let f = fixture(&[("main.tera", r#"{% include "gone.tera" %}"#)]);
        let mut engine = TemplateEngine::new();

        let err = engine
            .render(TransformKind::TraitsHeader, "main.tera", &context("Demo"), &f.uri)
            .unwrap_err();
        assert!(matches!(*err, Error::ResourceNotFound { .. }));
        assert!(!engine.cache().contains(TransformKind::TraitsHeader));
    }

    #[test]
    fn test_failed_render_writes_nothing() {
        let f = fixture(&[("main.tera", "{{ missing_variable }}")]);
        let mut engine = TemplateEngine::new();
        let sink = Resource::new(f.temp.path().join("out/Demo.idl"));

        let err = engine
            .apply(
                TransformKind::InterfaceDefinition,
                "main.tera",
                &context("Demo"),
                &f.uri,
                &sink,
            )
            .unwrap_err();

        assert!(matches!(*err, Error::Transformation { .. }));
        assert!(!sink.exists());
    }

    #[test]
    fn test_apply_writes_output() {
        let f = fixture(&[("main.tera", "module {{ model_name }} {};")]);
        let mut engine = TemplateEngine::new();
        let sink = Resource::new(f.temp.path().join("out/Demo.idl"));

        let result = engine
            .apply(
                TransformKind::InterfaceDefinition,
                "main.tera",
                &context("Demo"),
                &f.uri,
                &sink,
            )
            .unwrap();

        assert_eq!(result, WriteResult::Written);
        assert_eq!(fs::read_to_string(sink.path()).unwrap(), "module Demo {};");
    }

    #[test]
    fn test_document_function_in_template() {
        let f = fixture(&[(
            "main.tera",
            r#"{% set shared = document(path="shared.opendds") %}{{ shared.attrs.name }}"#,
        )]);
        fs::write(
            f.temp.path().join("models/shared.opendds"),
            r#"<opendds:OpenDDSModel name="Shared"/>"#,
        )
        .unwrap();
        let mut engine = TemplateEngine::new();

        let out = engine
            .render(TransformKind::HeaderBody, "main.tera", &context("Demo"), &f.uri)
            .unwrap();
        assert_eq!(out, "Shared");
    }
}
