pub mod list_cmd;
pub mod logging;
pub mod serve_cmd;

use clap::Parser;

use crate::list_cmd::ListCommand;
use crate::serve_cmd::ServeCommand;

/// Incremental file finder for Vim.
#[derive(Debug, Parser)]
#[command(name = "walker", version)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub subcommand: Subcommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    /// Serve a Vim job channel on stdin/stdout.
    Serve(ServeCommand),

    /// Walk a directory and print the matching files.
    List(ListCommand),
}
