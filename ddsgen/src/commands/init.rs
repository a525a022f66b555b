use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::Args;
use ddsgen_codegen::{batch, config::default_bundle_dir};
use ddsgen_core::{FsFileProvider, TracingErrorHandler};
use eyre::{Result, WrapErr, eyre};

#[derive(Args)]
pub struct InitCommand {
    /// Model file (.opendds)
    pub model: PathBuf,

    /// Target directory for generated artifacts (defaults to the model's directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl InitCommand {
    pub fn run(&self) -> Result<()> {
        if !self.model.is_file() {
            return Err(eyre!("model file '{}' does not exist", self.model.display()));
        }

        let provider = Arc::new(FsFileProvider::new(PathBuf::new(), default_bundle_dir()));
        let spec = batch::write_spec(
            &self.model,
            self.output.as_deref(),
            provider,
            Arc::new(TracingErrorHandler),
        )
        .wrap_err("Failed to write generation spec")?;

        println!("Created {}", spec.path().display());
        println!();
        println!("Next steps:");
        println!("  ddsgen generate --spec {}", display_relative(spec.path()));
        Ok(())
    }
}

fn display_relative(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
