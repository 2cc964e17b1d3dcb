//! Hermes Assistant Library Crate
//!
//! Configuration, console presentation and the interactive menu loop. The
//! `hermes` binary is a thin wrapper around this library.

pub mod config;
pub mod display;
pub mod shell;
