//! Persistent storage.
//!
//! Two files live under the data directory: `config.toml` (see
//! [`ConfigStore`]) and `break-log.json` (see [`BreakLogStore`]). Both
//! stores take explicit paths so tests and alternate front ends can
//! point them anywhere.

mod config_store;
mod log_store;

pub use config_store::ConfigStore;
pub use log_store::{BreakLogEntry, BreakLogStore};

use std::path::PathBuf;

use crate::error::{CoreError, Result};

/// Returns `~/.config/breakroom[-dev]/` based on BREAKROOM_ENV.
///
/// Set `BREAKROOM_ENV=dev` to use the development data directory.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined or the
/// directory cannot be created.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .ok_or_else(|| CoreError::Custom("could not determine home directory".into()))?
        .join(".config");
    let env = std::env::var("BREAKROOM_ENV").unwrap_or_else(|_| "production".to_string());
    let dir = if env == "dev" {
        base_dir.join("breakroom-dev")
    } else {
        base_dir.join("breakroom")
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
