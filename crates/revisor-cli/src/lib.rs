//! Revisor CLI library.
//!
//! This library provides the core functionality for the `revisor` command-line
//! interface: argument parsing, store and config locations, command execution,
//! and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, CliFormat, Command};
pub use error::{CliError, Result};
pub use output::Formatter;
