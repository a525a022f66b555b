//! Generate command report data structures.

use std::path::PathBuf;

use ddsgen_codegen::{Generation, GenerationState};
use ddsgen_core::Diagnostic;

use super::output::{Output, Report};

/// Outcome of a generation run.
#[derive(Debug)]
pub struct GenerateReport {
    pub spec_path: PathBuf,
    pub generations: Vec<Generation>,
    /// Everything reported through the error handler.
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerateReport {
    /// Whether every requested kind was written or skipped.
    pub fn is_success(&self) -> bool {
        self.generations.iter().all(Generation::is_success)
    }

    fn count(&self, f: impl Fn(&Generation) -> bool) -> usize {
        self.generations.iter().filter(|g| f(g)).count()
    }
}

impl Report for GenerateReport {
    fn render(&self, out: &mut dyn Output) {
        for diagnostic in &self.diagnostics {
            out.warning(&diagnostic.to_string());
        }
        if !self.diagnostics.is_empty() {
            out.newline();
        }

        out.section(&format!("Generated from {}", self.spec_path.display()));
        for generation in &self.generations {
            match (&generation.state, &generation.artifact) {
                (GenerationState::Written, Some(path)) => out.added_item(&path.display().to_string()),
                (GenerationState::Skipped, _) => {
                    out.list_item(&format!("{} skipped (no data library)", generation.kind))
                }
                (GenerationState::Aborted { error }, _) => {
                    out.failed_item(&format!("{}: {}", generation.kind, error))
                }
                (state, _) => out.list_item(&format!("{}: {}", generation.kind, state)),
            }
        }

        out.newline();
        out.preformatted(&format!(
            "{} written, {} skipped, {} failed",
            self.count(Generation::is_written),
            self.count(Generation::is_skipped),
            self.count(|g| !g.is_success()),
        ));
    }
}
