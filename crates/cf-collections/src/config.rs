use std::path::{Path, PathBuf};

use cf_core::config::{env_opt, env_or};

/// Data directory used when `PB_DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "./pb_data";

/// Where the collection store keeps its data.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Data directory (default `./pb_data`). Env var: `PB_DATA_DIR`.
    pub data_dir: PathBuf,
    /// Database URL. Env var: `DATABASE_URL`; defaults to `<data_dir>/data.db` (sqlite).
    pub database_url: String,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        let data_dir = PathBuf::from(env_or("PB_DATA_DIR", DEFAULT_DATA_DIR));
        let database_url = env_opt("DATABASE_URL").unwrap_or_else(|| sqlite_url(&data_dir));
        Self {
            data_dir,
            database_url,
        }
    }

    /// Sqlite store rooted at `data_dir`.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let database_url = sqlite_url(&data_dir);
        Self {
            data_dir,
            database_url,
        }
    }

    pub fn is_sqlite(&self) -> bool {
        self.database_url.starts_with("sqlite:")
    }
}

/// `sqlite://<dir>/data.db?mode=rwc` (file created on first open).
pub fn sqlite_url(data_dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", data_dir.join("data.db").display())
}
