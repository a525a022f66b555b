use std::path::{Path, PathBuf};

use ddsgen_core::Severity;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result type for model operations (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("{message}")]
    #[diagnostic(code(ddsgen::configuration))]
    Configuration { message: String },

    #[error("'{}' does not exist", .path.display())]
    #[diagnostic(
        code(ddsgen::not_found),
        help("check the model and target names in the generation spec")
    )]
    ResourceNotFound { path: PathBuf },

    #[error("failed to parse '{}'", .path.display())]
    #[diagnostic(code(ddsgen::parse_error))]
    Parse {
        path: PathBuf,
        #[source_code]
        src: NamedSource<String>,
        #[label("{reason}")]
        span: Option<SourceSpan>,
        reason: String,
    },

    #[error("query '{query}' matched {count} nodes, expected exactly one")]
    #[diagnostic(
        code(ddsgen::query_cardinality),
        help("a model document declares its name exactly once, on the root OpenDDSModel element")
    )]
    QueryCardinality { query: String, count: usize },

    #[error("{transform} transformation failed: {message}")]
    #[diagnostic(code(ddsgen::transformation))]
    Transformation {
        transform: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("failed to access '{}'", .path.display())]
    #[diagnostic(code(ddsgen::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Box<Self> {
        Box::new(Error::Configuration {
            message: message.into(),
        })
    }

    /// Create a not-found error for a path
    pub fn not_found(path: impl AsRef<Path>) -> Box<Self> {
        Box::new(Error::ResourceNotFound {
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Create a parse error pointing at a byte offset in the source
    pub fn parse(
        reason: impl Into<String>,
        src: &str,
        path: impl AsRef<Path>,
        offset: Option<usize>,
    ) -> Box<Self> {
        let path = path.as_ref();
        let span = offset.map(|o| SourceSpan::from(o.min(src.len())..o.min(src.len())));
        Box::new(Error::Parse {
            path: path.to_path_buf(),
            src: NamedSource::new(path.display().to_string(), src.to_string()),
            span,
            reason: reason.into(),
        })
    }

    /// Create a cardinality error for a single-value query
    pub fn cardinality(query: impl Into<String>, count: usize) -> Box<Self> {
        Box::new(Error::QueryCardinality {
            query: query.into(),
            count,
        })
    }

    /// Create a transformation error without an underlying cause
    pub fn transformation(transform: impl Into<String>, message: impl Into<String>) -> Box<Self> {
        Box::new(Error::Transformation {
            transform: transform.into(),
            message: message.into(),
            source: None,
        })
    }

    /// Create a transformation error wrapping the engine's error
    pub fn transformation_caused_by(
        transform: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Box<Self> {
        Box::new(Error::Transformation {
            transform: transform.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        })
    }

    /// Create an I/O error for a path
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Box<Self> {
        Box::new(Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })
    }

    /// Severity this error is reported at.
    ///
    /// Missing resources and ambiguous queries are steady-state conditions
    /// while editing a model; everything else aborted real work.
    pub fn severity(&self) -> Severity {
        match self {
            Error::ResourceNotFound { .. } | Error::QueryCardinality { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}
