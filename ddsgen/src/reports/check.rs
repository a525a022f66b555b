//! Check command report data structures.

use std::path::PathBuf;

use ddsgen_core::Diagnostic;

use super::output::{Output, Report};

/// Report data from spec validation.
#[derive(Debug)]
pub struct CheckReport {
    pub spec_path: PathBuf,
    /// Why generation cannot start.
    pub problem: Option<String>,
    pub model_name: Option<String>,
    pub transport_ids: Vec<String>,
    pub has_data_library: bool,
    /// Artifacts a full run would write.
    pub artifacts: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    /// Whether generation can proceed without errors.
    pub fn is_valid(&self) -> bool {
        self.problem.is_none()
            && self.model_name.is_some()
            && !self.diagnostics.iter().any(|d| d.severity.is_error())
    }
}

impl Report for CheckReport {
    fn render(&self, out: &mut dyn Output) {
        if let Some(problem) = &self.problem {
            out.warning(&format!("error: {}", problem));
        }
        for diagnostic in &self.diagnostics {
            out.warning(&diagnostic.to_string());
        }
        if !self.is_valid() {
            return;
        }

        out.preformatted(&format!("✓ {} is valid", self.spec_path.display()));
        out.newline();
        if let Some(name) = &self.model_name {
            out.key_value("model", name);
        }
        let transports = if self.transport_ids.is_empty() {
            "none".to_string()
        } else {
            self.transport_ids.join(", ")
        };
        out.key_value("transports", &transports);
        out.key_value(
            "data library",
            if self.has_data_library { "yes" } else { "no" },
        );

        out.newline();
        out.section(&format!("{} artifacts", self.artifacts.len()));
        for artifact in &self.artifacts {
            out.list_item(artifact);
        }
    }
}
