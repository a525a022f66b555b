mod commands;
mod ops;
mod reports;

use clap::Parser;
use eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cli.run()
}

/// `RUST_LOG` wins; otherwise `-v` raises ddsgen's own level to debug.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "ddsgen=info",
        1 => "ddsgen=debug,ddsgen_codegen=debug,ddsgen_model=debug",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
