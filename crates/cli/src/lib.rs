//! `pilot`: command-line supervisor for the session runtime.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
