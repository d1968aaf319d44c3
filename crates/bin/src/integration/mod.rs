//! Glue between the command line and the pipeline crates.
//!
//! Loads inputs with progress feedback and keeps the subcommands free of
//! file-handling details.

pub(crate) mod inputs;
