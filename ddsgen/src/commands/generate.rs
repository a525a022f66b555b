use std::path::PathBuf;

use clap::Args;
use ddsgen_codegen::TransformKind;
use eyre::Result;

use super::{ConfigArgs, UnwrapOrExit};
use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct GenerateCommand {
    /// Path to the .codegen spec
    #[arg(short, long)]
    pub spec: PathBuf,

    /// Artifact to generate (repeatable; defaults to every artifact)
    #[arg(short, long = "kind", value_name = "KIND")]
    pub kinds: Vec<TransformKind>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl GenerateCommand {
    pub fn run(&self) -> Result<()> {
        let config = self.config.load(&self.spec).unwrap_or_exit();
        let report = ops::generate(&self.spec, &config, &self.kinds);
        report.render(&mut TerminalOutput::new());

        if !report.is_success() {
            std::process::exit(1);
        }
        Ok(())
    }
}
