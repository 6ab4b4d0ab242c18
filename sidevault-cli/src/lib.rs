//! Sidevault CLI Library
//!
//! Command-line definitions and settings resolution for the `sidevault`
//! binary, exposed for testing.

pub mod cli;
pub mod config;

pub use cli::{AuthArgs, Cli, Commands, RenewArgs};
pub use config::{FileConfig, load_file_config, resolve_settings};
