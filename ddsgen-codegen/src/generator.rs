//! Generation orchestrator.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use ddsgen_core::{ErrorHandler, FileProvider, Severity, file_stem};
use ddsgen_model::{
    Document, Error, InstanceConfig, ReferenceResolver, Result, SpecResolver,
    XmlReferenceResolver,
};
use serde_json::{Map, Value, json};
use tera::Context;

use crate::{
    Config, GenerationState, InputSelection, Program, StateMachine, TransformKind,
    config::DEFAULT_MODEL_EXTENSION,
    template::{TemplateEngine, UriResolver},
};

/// Outcome of one transformation.
#[derive(Debug, Clone)]
pub struct Generation {
    pub kind: TransformKind,
    pub state: GenerationState,
    /// States entered, starting with `NotStarted`.
    pub history: Vec<GenerationState>,
    /// Written artifact.
    pub artifact: Option<PathBuf>,
}

impl Generation {
    fn new(machine: StateMachine, artifact: Option<PathBuf>) -> Self {
        Self {
            kind: machine.kind(),
            state: machine.state().clone(),
            history: machine.history().to_vec(),
            artifact,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state.is_success()
    }

    pub fn is_written(&self) -> bool {
        self.state == GenerationState::Written
    }

    pub fn is_skipped(&self) -> bool {
        self.state == GenerationState::Skipped
    }
}

/// An error and the severity it is reported at.
struct Failure {
    error: Box<Error>,
    severity: Severity,
}

impl Failure {
    /// Reference resolution problems always abort real work.
    fn resolution(error: Box<Error>) -> Self {
        Self {
            error,
            severity: Severity::Error,
        }
    }
}

impl From<Box<Error>> for Failure {
    fn from(error: Box<Error>) -> Self {
        let severity = error.severity();
        Self { error, severity }
    }
}

/// Drives transformations for one generation spec.
///
/// Each kind runs through the same sequence: resolve the spec, prepare the
/// target directory, check applicability, select the input document,
/// transform, write. Output is rendered in memory first so a failure never
/// leaves a partial artifact behind.
pub struct Generator {
    spec: Box<dyn SpecResolver>,
    provider: Arc<dyn FileProvider>,
    handler: Arc<dyn ErrorHandler>,
    resolver: Box<dyn ReferenceResolver>,
    engine: TemplateEngine,
    model_extension: String,
}

impl Generator {
    pub fn new(
        spec: impl SpecResolver + 'static,
        provider: Arc<dyn FileProvider>,
        handler: Arc<dyn ErrorHandler>,
    ) -> Self {
        Self {
            spec: Box::new(spec),
            resolver: Box::new(XmlReferenceResolver::new(Arc::clone(&provider))),
            provider,
            handler,
            engine: TemplateEngine::new(),
            model_extension: DEFAULT_MODEL_EXTENSION.to_string(),
        }
    }

    /// Apply search paths, reload and model extension settings.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.resolver = Box::new(
            XmlReferenceResolver::new(Arc::clone(&self.provider))
                .with_variables(config.search_paths.clone()),
        );
        self.engine.cache_mut().set_reload(config.force_reload);
        self.model_extension = config.model_extension.clone();
        self
    }

    /// Replace the reference resolution pass.
    pub fn with_resolver(mut self, resolver: impl ReferenceResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn spec(&self) -> &dyn SpecResolver {
        self.spec.as_ref()
    }

    pub fn spec_mut(&mut self) -> &mut dyn SpecResolver {
        self.spec.as_mut()
    }

    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TemplateEngine {
        &mut self.engine
    }

    /// Run one transformation, reporting any failure through the error handler.
    pub fn generate(&mut self, kind: TransformKind) -> Generation {
        let mut machine = StateMachine::new(kind);
        match self.run(kind, &mut machine) {
            Ok(artifact) => Generation::new(machine, artifact),
            Err(failure) => {
                machine.abort(&failure.error);
                self.handler.report(
                    failure.severity,
                    kind.label(),
                    &failure.error.to_string(),
                    Some(failure.error.as_ref()),
                );
                Generation::new(machine, None)
            }
        }
    }

    /// Run one transformation, returning any failure to the caller unreported.
    pub fn try_generate(&mut self, kind: TransformKind) -> Result<Generation> {
        let mut machine = StateMachine::new(kind);
        match self.run(kind, &mut machine) {
            Ok(artifact) => Ok(Generation::new(machine, artifact)),
            Err(failure) => {
                machine.abort(&failure.error);
                Err(failure.error)
            }
        }
    }

    /// Generate every artifact; a failing kind does not stop the others.
    pub fn generate_all(&mut self) -> Vec<Generation> {
        TransformKind::ARTIFACTS
            .into_iter()
            .map(|kind| self.generate(kind))
            .collect()
    }

    /// Why generation cannot start, if it cannot.
    pub fn validate(&mut self) -> Option<String> {
        let model = match self.spec.model_path() {
            Ok(path) => self.provider.from_workspace(&path),
            Err(err) => return Some(err.to_string()),
        };
        if !model.exists() {
            return Some(format!("model file '{}' does not exist", model.path().display()));
        }

        let target = match self.spec.target_path() {
            Ok(path) => self.provider.from_workspace(&path),
            Err(err) => return Some(err.to_string()),
        };
        if target.exists() && !target.is_dir() {
            return Some(format!(
                "target '{}' is not a directory",
                target.path().display()
            ));
        }
        None
    }

    /// The model's name, reported through the error handler when unavailable.
    pub fn model_name(&mut self) -> Option<String> {
        self.spec.model_name()
    }

    /// File names a full run would produce.
    ///
    /// Falls back to the model file's stem when the model name cannot be read.
    pub fn artifact_names(&mut self) -> Vec<String> {
        let Ok(model_path) = self.spec.model_path() else {
            return Vec::new();
        };
        let (name, data_library) = match self.spec.model() {
            Ok(cache) => (
                cache.try_model_name().ok(),
                cache.try_has_data_library().unwrap_or(true),
            ),
            Err(_) => (None, true),
        };
        let Some(name) = name.or_else(|| file_stem(&model_path)) else {
            return Vec::new();
        };

        TransformKind::ARTIFACTS
            .into_iter()
            .filter(|kind| data_library || !kind.requires_data_library())
            .map(|kind| kind.artifact_name(&name))
            .collect()
    }

    fn run(
        &mut self,
        kind: TransformKind,
        machine: &mut StateMachine,
    ) -> std::result::Result<Option<PathBuf>, Failure> {
        let model_path = self.spec.model_path()?;
        let target = self.spec.target_path()?;
        machine.advance(GenerationState::SpecResolved);

        let target_dir = self.provider.from_workspace(&target);
        if target_dir.exists() && !target_dir.is_dir() {
            return Err(Error::configuration(format!(
                "target '{}' is not a directory",
                target_dir.path().display()
            ))
            .into());
        }
        target_dir
            .create_dir_all()
            .map_err(|e| Error::io(target_dir.path(), e))?;
        machine.advance(GenerationState::TargetReady);

        let cache = self.spec.model()?;
        if kind.requires_data_library() && !cache.try_has_data_library()? {
            tracing::debug!(kind = %kind, "model declares no data library");
            machine.advance(GenerationState::Skipped);
            return Ok(None);
        }
        let model_name = cache.try_model_name()?;
        let transport_ids: Vec<String> = cache.try_transport_ids()?.into_iter().collect();

        let input = match kind.input() {
            InputSelection::ResolvedModel => Arc::new(
                self.spec
                    .source(Some(self.resolver.as_ref()))
                    .map_err(Failure::resolution)?,
            ),
            InputSelection::RawModel => self.spec.model()?.try_document()?,
            InputSelection::SpecDocument => Arc::new(self.spec.source(None)?),
        };
        machine.advance(GenerationState::DocumentReady);

        let artifact_name = kind.artifact_name(&model_name);
        let rendered = match kind.program() {
            Program::ResolveReferences => input.to_xml(),
            Program::Template(template) => {
                let instances = self.spec.transport_config()?;
                let context = template_context(
                    kind,
                    &input,
                    &model_name,
                    &artifact_name,
                    &transport_ids,
                    &instances,
                );
                let uri = self.uri_resolver(&model_path);
                self.engine.render(kind, template, &context, &uri)?
            }
        };
        machine.advance(GenerationState::Transformed);

        let sink = self.provider.from_workspace(&target.join(&artifact_name));
        sink.write(&rendered)
            .map_err(|e| Error::io(sink.path(), e))?;
        machine.advance(GenerationState::Written);

        self.provider.refresh(sink.path());
        tracing::info!(kind = %kind, artifact = %sink.path().display(), "generated");
        Ok(Some(sink.into_path()))
    }

    fn uri_resolver(&self, model_path: &Path) -> UriResolver {
        let uri = UriResolver::new(Arc::clone(&self.provider), &self.model_extension);
        match model_path.parent() {
            Some(dir) => uri.with_model_dir(dir),
            None => uri,
        }
    }
}

fn template_context(
    kind: TransformKind,
    input: &Document,
    model_name: &str,
    artifact: &str,
    transport_ids: &[String],
    instances: &[InstanceConfig],
) -> Context {
    let mut context = Context::new();
    context.insert("model", &input.to_json());
    context.insert("model_name", model_name);
    context.insert("artifact", artifact);
    context.insert("kind", kind.label());
    context.insert("transport_ids", transport_ids);
    context.insert("instances", &instances_json(instances));
    context
}

fn instances_json(instances: &[InstanceConfig]) -> Value {
    instances
        .iter()
        .map(|instance| {
            let transports: Vec<Value> = instance
                .transports
                .iter()
                .map(|t| {
                    let options: Map<String, Value> = t
                        .options
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect();
                    json!({ "index": t.index, "kind": t.kind, "options": options })
                })
                .collect();
            json!({ "name": instance.name, "transports": transports })
        })
        .collect()
}
