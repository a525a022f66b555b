use std::{path::PathBuf, sync::Arc};

use clap::Args;
use ddsgen_codegen::batch;
use ddsgen_core::TracingErrorHandler;
use eyre::Result;

use super::{ConfigArgs, UnwrapOrExit};
use crate::reports::{GenerateReport, Report, TerminalOutput};

#[derive(Args)]
pub struct BatchCommand {
    /// Model file (.opendds)
    pub model: PathBuf,

    /// Output directory (defaults to the model's directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl BatchCommand {
    pub fn run(&self) -> Result<()> {
        let config = self.config.load(&self.model).unwrap_or_exit();
        let generations = batch::generate_model(
            &self.model,
            self.output.as_deref(),
            &config,
            Arc::new(TracingErrorHandler),
        )?;

        GenerateReport {
            spec_path: batch::spec_path_for(&self.model)?,
            generations,
            diagnostics: Vec::new(),
        }
        .render(&mut TerminalOutput::new());
        Ok(())
    }
}
