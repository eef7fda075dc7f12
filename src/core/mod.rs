//! Core types shared by the server and the producer commands.

mod error;
mod pointer;
mod state;

pub use error::PreviewError;
pub use pointer::{ASSETS_DIR, ENTRY_FILE, Pointer, expand, today};
pub use state::{enable_graceful_shutdown, is_shutdown, register_server, setup_shutdown_handler};
