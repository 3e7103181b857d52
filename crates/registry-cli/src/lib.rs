//! CLI library components for the registry survival pipeline.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod manifest;
pub mod summary;
pub mod types;
