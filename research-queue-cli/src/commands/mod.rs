//! Subcommand implementations.

pub mod config;
pub mod exchange;
pub mod topics;
pub mod view;
