//! Modseal CLI - sign and verify script modules
//!
//! Command parsing and execution for the `modseal` binary, kept in a library
//! so the commands can be driven from tests.

pub mod commands;

pub use commands::*;
