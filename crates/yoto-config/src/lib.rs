//! Configuration for the Yoto OAuth proxy.
//!
//! Provides TOML-based configuration with:
//! - Layered files (user config directory + project-local override)
//! - Environment overrides for deployment credentials
//! - Secret redaction for display

pub mod discovery;
pub mod env;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    load_explicit, user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
