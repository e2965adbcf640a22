//! API Module - command handlers behind the CLI

pub mod commands;
