mod batch;
mod check;
mod completions;
mod generate;
mod init;
mod list;

use std::path::{Path, PathBuf};

use batch::BatchCommand;
use check::CheckCommand;
use clap::{ArgAction, Args, Parser, Subcommand};
use completions::CompletionsCommand;
use ddsgen_codegen::Config;
use eyre::Result;
use generate::GenerateCommand;
use init::InitCommand;
use list::ListCommand;

/// Extension trait for exiting on model errors with pretty formatting
pub(crate) trait UnwrapOrExit<T> {
    fn unwrap_or_exit(self) -> T;
}

impl<T> UnwrapOrExit<T> for ddsgen_model::Result<T> {
    fn unwrap_or_exit(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                eprintln!("{:?}", miette::Report::new(*e));
                std::process::exit(1);
            }
        }
    }
}

#[derive(Parser)]
#[command(name = "ddsgen")]
#[command(version)]
#[command(about = "Generate OpenDDS application code from models")]
pub(crate) struct Cli {
    /// Log more (-v for debug, -vv for everything)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Generate(cmd) => cmd.run(),
            Commands::Batch(cmd) => cmd.run(),
            Commands::Check(cmd) => cmd.run(),
            Commands::List(cmd) => cmd.run(),
            Commands::Init(cmd) => cmd.run(),
            Commands::Completions(cmd) => cmd.run(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate artifacts from a .codegen spec
    Generate(GenerateCommand),

    /// Generate every artifact straight from a model, stopping at the first failure
    Batch(BatchCommand),

    /// Check that a spec can be generated
    Check(CheckCommand),

    /// List the artifacts a spec would produce
    List(ListCommand),

    /// Write a .codegen spec for a model
    Init(InitCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Settings shared by the generating commands.
#[derive(Args)]
pub(crate) struct ConfigArgs {
    /// Path to ddsgen.toml (defaults to one next to the spec or model)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Template bundle directory
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Recompile templates on every use
    #[arg(long)]
    pub force_reload: bool,
}

impl ConfigArgs {
    /// Configuration for a run on `file`, with flags applied over the file.
    pub fn load(&self, file: &Path) -> ddsgen_model::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::discover(file.parent().unwrap_or(Path::new(".")))?,
        };
        if let Some(templates) = &self.templates {
            config.templates = Some(templates.clone());
        }
        if self.force_reload {
            config.force_reload = true;
        }
        Ok(config)
    }
}
