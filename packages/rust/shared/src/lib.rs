//! Shared types, error model, and configuration for notesite.
//!
//! This crate is the foundation depended on by all other notesite crates.
//! It provides:
//! - [`NotesiteError`] — the unified error type
//! - Domain types ([`Classification`], [`Chapter`], [`ProblemEntry`])
//! - Configuration ([`AppConfig`], [`SiteConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, SiteConfig, SiteSection, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{NotesiteError, Result};
pub use types::{Chapter, Classification, ProblemEntry};
