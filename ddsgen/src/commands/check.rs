use std::path::PathBuf;

use clap::Args;
use eyre::Result;

use super::{ConfigArgs, UnwrapOrExit};
use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct CheckCommand {
    /// Path to the .codegen spec
    #[arg(short, long)]
    pub spec: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl CheckCommand {
    pub fn run(&self) -> Result<()> {
        let config = self.config.load(&self.spec).unwrap_or_exit();
        let report = ops::check(&self.spec, &config);
        report.render(&mut TerminalOutput::new());

        if !report.is_valid() {
            std::process::exit(1);
        }
        Ok(())
    }
}
