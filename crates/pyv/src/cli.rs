//! CLI argument parsing. A thin adapter: verbs and flags translate to
//! engine façade calls in `main`.

use clap::{Parser, Subcommand};

/// pyv - Python version management
#[derive(Parser, Debug)]
#[command(name = "pyv")]
#[command(author, version, about = "Manage side-by-side Python installations")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Show informational and debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Version to install (if needed) and activate
    #[arg(value_name = "VERSION")]
    pub request: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Output the versions of Python available from the mirror
    #[command(alias = "list")]
    Ls {
        #[command(subcommand)]
        scope: Option<LsScope>,
    },

    /// Install (if necessary) and activate the latest Python release
    Latest,

    /// Install (if necessary) and activate the latest stable Python release
    Stable,

    /// Output the currently active version
    Status,

    /// Install Python <version> but do NOT activate
    Install {
        version: String,

        /// Reinstall even if the version is already present
        #[arg(long)]
        force: bool,
    },

    /// Execute Python <version> with [args ...]
    Use {
        version: String,

        /// Code passed to the interpreter via -c
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Output the executable path for <version>
    Bin { version: String },

    /// Remove the given version(s)
    Rm {
        #[arg(required = true)]
        versions: Vec<String>,
    },

    /// Deactivate and fall back to the system Python installation
    #[command(alias = "disable")]
    Default,
}

#[derive(Subcommand, Debug)]
pub enum LsScope {
    /// Output the installed versions of Python
    Installed,
    /// Output the latest Python version available
    Latest,
    /// Output the latest stable Python version available
    Stable,
}
