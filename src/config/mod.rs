//! Configuration module for Board-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Only the `[site]` section is mandatory; every other section has defaults.
//!
//! # Example
//!
//! ```no_run
//! use board_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Scanning {} pages per board", config.site.pages_per_board);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AnalysisConfig, Config, FetchConfig, NotifyConfig, OutputConfig, PolitenessConfig,
    SiteConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
