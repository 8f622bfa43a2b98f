//! Subcommand implementations.

pub(crate) mod config;
pub(crate) mod fs;
pub(crate) mod serve;
pub(crate) mod tasks;
