//! The `rega` field client.
//!
//! Wires a durable [`SqliteStore`](rega_storage::SqliteStore), an HTTP
//! document store and a health probe into a
//! [`FieldService`](rega_sync::FieldService) and exposes its operations as
//! subcommands.

pub mod cli;
pub mod commands;
pub mod config;

pub use cli::{Cli, Command, PoolCommand};
pub use config::CliConfig;
