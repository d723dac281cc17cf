//! fmsh Configuration System
//!
//! Provides YAML-based configuration for the fmsh shell.
//!
//! # Configuration Loading Priority
//!
//! 1. Compiled-in defaults
//! 2. `/etc/fmsh/fmsh.yaml` (system-wide)
//! 3. `~/.config/fmsh/fmsh.yaml` (user)
//! 4. `./fmsh.yaml` (project-local)
//! 5. `FMSH_CONFIG=/path/to/config.yaml` (explicit)
//! 6. Environment variables (highest priority)
//!
//! # Example Configuration
//!
//! ```yaml
//! shell:
//!   prompt: "{green}{cwd}{reset}> "
//!   history:
//!     file: "~/.fmsh_history"
//!
//! logging:
//!   level: debug
//!   file: "${HOME}/fmsh.log"
//! ```

#![allow(missing_docs)]

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::*;

/// Load configuration from default locations.
///
/// Searches for config files in order and merges them.
/// Environment variables override file values.
pub fn load() -> Result<FmshConfig, ConfigError> {
    ConfigLoader::new().load()
}

/// Load configuration from a specific file.
pub fn load_from_file(path: &str) -> Result<FmshConfig, ConfigError> {
    ConfigLoader::new().with_file(path).load()
}
