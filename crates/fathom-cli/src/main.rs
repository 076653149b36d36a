//! fathom CLI — scan a directory, then print call-graph and definition
//! projections as JSON or a human summary.

use clap::Parser;

mod cli_args;
mod commands;

use cli_args::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Scan {
            path,
            include,
            max_depth,
            external,
        } => commands::scan::run(&path, &include, max_depth, external, cli.json),
        Commands::Defs {
            path,
            file,
            exported,
        } => commands::defs::run(&path, &file, exported, cli.json),
    };

    std::process::exit(exit_code);
}
