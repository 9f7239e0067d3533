mod config;
pub mod database;
mod records;

pub use config::{
    ChallengeConfig, Config, SensitivityConfig, SoundConfig, ACCELERATION_RANGE,
    ACCELERATION_STEP, FREQUENCY_TARGET_RANGE, THRESHOLD_PRECISION, TIME_RANGE, TIME_STEP,
};
pub use database::{Database, RECORDS_KEY};
pub use records::{decode_records, encode_records, PlayRecord};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns the directory holding the database and config file.
///
/// `MILKPAIL_DATA_DIR` wins when set. Otherwise `~/.config/milkpail[-dev]/`
/// based on `MILKPAIL_ENV`; set `MILKPAIL_ENV=dev` to use the development
/// data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("MILKPAIL_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("MILKPAIL_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("milkpail-dev")
            } else {
                base_dir.join("milkpail")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
