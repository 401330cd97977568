//! Operator tooling for a Casebook repository.
//!
//! The binary in `main.rs` loads an [`AdminConfig`], opens the configured
//! backend, and hands one [`Command`] to [`run`].

pub mod commands;
pub mod config;

pub use commands::{Command, run};
pub use config::{AdminConfig, Backend};
