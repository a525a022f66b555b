use std::path::PathBuf;

use clap::Args;
use eyre::Result;

use super::{ConfigArgs, UnwrapOrExit};
use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct ListCommand {
    /// Path to the .codegen spec
    #[arg(short, long)]
    pub spec: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl ListCommand {
    pub fn run(&self) -> Result<()> {
        let config = self.config.load(&self.spec).unwrap_or_exit();
        ops::list(&self.spec, &config).render(&mut TerminalOutput::new());
        Ok(())
    }
}
