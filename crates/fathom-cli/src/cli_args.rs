use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fathom", version, about = "Scope graphs and call graphs over tree-sitter")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as structured JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Analyze a directory and print its call graph
    Scan {
        /// Directory to analyze
        path: String,
        /// Only include files matching this glob (repeatable)
        #[arg(long)]
        include: Vec<String>,
        /// Depth cap from every top-level node
        #[arg(long)]
        max_depth: Option<u32>,
        /// Emit edges to built-in callees
        #[arg(long)]
        external: bool,
    },

    /// List the definitions found in one file of a project
    Defs {
        /// Directory to analyze
        path: String,
        /// File (relative to the directory) to list definitions for
        file: String,
        /// Only exported function-like definitions
        #[arg(long)]
        exported: bool,
    },
}
