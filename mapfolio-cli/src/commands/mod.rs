//! CLI subcommands.

pub mod browse;
pub mod common;
pub mod config;
pub mod suggest;
