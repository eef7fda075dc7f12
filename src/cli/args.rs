//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Live preview server for a markdown diary
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: preview.toml, searched upward)
    #[arg(short = 'C', long, global = true, default_value = "preview.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the preview server
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory holding the diary entries
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        docs: Option<PathBuf>,
    },

    /// Register an entry and keep it alive with heartbeats until Ctrl+C
    #[command(visible_alias = "a")]
    Attach {
        /// Entry pointer or expression ($NOW, $NOW-1, $NOW+'-night')
        pointer: String,

        #[command(flatten)]
        server: ServerArgs,
    },

    /// Ask every open preview page to reload
    #[command(visible_alias = "r")]
    Refresh {
        /// Register this entry before refreshing
        pointer: Option<String>,

        #[command(flatten)]
        server: ServerArgs,
    },

    /// Print the entry currently registered with the server
    Pointer {
        #[command(flatten)]
        server: ServerArgs,
    },

    /// Create a new entry skeleton
    #[command(visible_alias = "n")]
    New {
        /// Entry pointer or expression
        #[arg(default_value = "$NOW")]
        pointer: String,
    },

    /// Open an entry in $VISUAL/$EDITOR, then refresh the preview
    #[command(visible_alias = "e")]
    Edit {
        /// Entry pointer or expression
        #[arg(default_value = "$NOW")]
        pointer: String,

        #[command(flatten)]
        server: ServerArgs,
    },

    /// List the entries in the docs directory
    Ls,

    /// Copy a file into an entry's assets and print its markdown snippet
    Add {
        /// File to add
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Entry pointer or expression
        #[arg(short, long, default_value = "$NOW")]
        entry: String,
    },
}

/// Where producer commands find the server.
#[derive(clap::Args, Debug, Clone)]
pub struct ServerArgs {
    /// Server base URL (default: derived from [serve] in the config)
    #[arg(short = 'u', long, value_hint = clap::ValueHint::Url)]
    pub url: Option<String>,
}
