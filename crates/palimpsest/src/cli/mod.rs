//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the palimpsest binary.

mod commands;
#[cfg(feature = "database")]
mod database;
mod dump_file;
mod inspect;

pub use commands::{Cli, Commands};
#[cfg(feature = "database")]
pub use database::{handle_export, handle_import};
pub use inspect::{handle_check, handle_gc, handle_history, handle_world_state};
