use std::path::PathBuf;

use super::output::{Output, Report};

/// Artifacts a spec would produce.
#[derive(Debug)]
pub struct ListReport {
    pub target: Option<PathBuf>,
    pub artifacts: Vec<String>,
}

impl Report for ListReport {
    fn render(&self, out: &mut dyn Output) {
        for artifact in &self.artifacts {
            let line = match &self.target {
                Some(target) => target.join(artifact).display().to_string(),
                None => artifact.clone(),
            };
            out.preformatted(&line);
        }
    }
}
