//! Command-line components for roitool.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
