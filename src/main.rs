mod actions;
mod archive;
mod cli;
mod commands;
mod common;
mod enrich;
mod merge;
mod record;
mod text;
mod xref;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use commands::{run_enrich, run_fetch_collection, run_merge, run_reconcile, run_xref};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::FetchCollection(args) => {
            run_fetch_collection(args)?;
        }
        Commands::Merge(args) => {
            run_merge(args)?;
        }
        Commands::Xref(args) => {
            run_xref(args)?;
        }
        Commands::Enrich(args) => {
            run_enrich(args)?;
        }
        Commands::Reconcile(args) => {
            run_reconcile(args)?;
        }
    }

    Ok(())
}
