//! Configuration model for cnab-run.
//!
//! This module defines the Config struct read from the optional runtime config
//! file (`--config` or `CNAB_RUN_CONFIG`). It supports forward-compatible YAML
//! parsing (unknown fields are ignored), defaults matching the standard CNAB
//! container layout, and validation of config values.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use types::MixinSettings;
