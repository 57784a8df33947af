//! CLI support: command handlers and CLI-specific errors

pub mod commands;
pub mod error;
