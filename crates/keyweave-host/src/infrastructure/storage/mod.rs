//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration from the platform
//! config directory, writes it back when settings change (hotkey toggle,
//! method switch), and supplies defaults when no file exists yet.

pub mod config;
pub mod mock;
