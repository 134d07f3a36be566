//! Command-line front-end for StatViz.
//!
//! The binary walks the same four steps as the interactive workflow (upload,
//! map variables, choose analysis, results) from flags, and exposes the
//! design, spatial, transformation and assistant services as subcommands.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod progress;
pub mod summary;
