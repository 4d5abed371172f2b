//! punch CLI library.
//!
//! This crate provides the command-line interface for punch.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, EditField};
pub use config::Config;
