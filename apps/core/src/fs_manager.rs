use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "ECHOMIND_DATA_DIR";

pub struct PortablePathManager;

impl PortablePathManager {
    /// Root data directory: `ECHOMIND_DATA_DIR` when set, otherwise `./data`.
    pub fn data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                return PathBuf::from(dir);
            }
        }

        match std::env::current_dir() {
            Ok(path) => path.join("data"),
            Err(e) => {
                warn!("Failed to get current directory: {}. Falling back to relative path.", e);
                PathBuf::from("data")
            }
        }
    }

    /// Database directory (`<data>/db`).
    pub fn db_dir() -> PathBuf {
        Self::data_dir().join("db")
    }

    /// Path of the SQLite key-value store.
    pub fn db_file() -> PathBuf {
        Self::db_dir().join("echomind.sqlite")
    }

    /// Creates the data and db directories if they do not exist.
    pub fn init() -> Result<(), std::io::Error> {
        let data_path = Self::data_dir();
        let db_path = Self::db_dir();

        if !data_path.exists() {
            info!("Creating data directory: {:?}", data_path);
            fs::create_dir_all(&data_path)?;
        }

        if !db_path.exists() {
            info!("Creating db directory: {:?}", db_path);
            fs::create_dir_all(&db_path)?;
        }

        Ok(())
    }
}
