//! diary-preview - live browser preview for a markdown diary entry.

mod cli;
mod config;
mod core;
mod embed;
mod entry;
mod logger;
mod preview;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands, producer, scaffold};
use config::PreviewConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = PreviewConfig::load(&cli)?;

    match &cli.command {
        Commands::Serve { .. } => cli::serve::bind_server(&config)?.run(),
        Commands::Attach { pointer, server } => {
            producer::attach(&config, pointer, server.url.as_deref())
        }
        Commands::Refresh { pointer, server } => {
            producer::refresh_command(&config, pointer.as_deref(), server.url.as_deref())
        }
        Commands::Pointer { server } => producer::pointer_command(&config, server.url.as_deref()),
        Commands::New { pointer } => {
            let pointer = producer::resolve_pointer(pointer)?;
            scaffold::new_entry(&config.docs_root(), &pointer).map(|_| ())
        }
        Commands::Edit { pointer, server } => {
            producer::edit_command(&config, pointer, server.url.as_deref())
        }
        Commands::Ls => {
            for name in scaffold::list_entries(&config.docs_root())? {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Add { file, entry } => {
            let pointer = producer::resolve_pointer(entry)?;
            let snippet = scaffold::add_asset(&config.docs_root(), &pointer, file, core::today())?;
            println!("{snippet}");
            Ok(())
        }
    }
}
