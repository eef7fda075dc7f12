//! Command-line interface module.

mod args;
pub mod producer;
pub mod scaffold;
pub mod serve;

pub use args::{Cli, Commands};
