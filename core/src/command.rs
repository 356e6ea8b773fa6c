use clap::Parser;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;
use crate::error::WalkerError;

/// Everything the editor can ask of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Command {
    /// Start a fresh walk. `args` are the raw command-line words.
    Run {
        #[serde(default)]
        args: Vec<String>,
    },
    /// Re-open the previous session.
    Resume,
    /// Like `Run`, rooted at the current buffer's directory.
    RunInBufferDir {
        #[serde(default)]
        args: Vec<String>,
    },
    Refresh {
        #[serde(default)]
        force: bool,
    },
    Accept,
    Cancel,
    /// Focus the query surface in insert mode.
    ToggleInsert,
    /// Back to the results surface in normal mode.
    ToggleNormal,
    MoveSelection { down: bool },
}

/// Arguments of `Run`: `PATTERN... [--path=DIR]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(name = "walk", no_binary_name = true, disable_help_flag = true)]
pub struct WalkArgs {
    /// Case-insensitive regular expressions matched against full paths.
    #[arg(value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Directory to walk; defaults to the editor's working directory.
    #[arg(long = "path")]
    pub path: Option<String>,
}

impl WalkArgs {
    pub fn parse_args(args: &[String]) -> Result<Self> {
        WalkArgs::try_parse_from(args).map_err(|err| WalkerError::InvalidArgs(err.to_string()))
    }
}
