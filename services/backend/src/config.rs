use cf_collections::config::StoreConfig;
use cf_core::config::env_parse_or;

/// Backend configuration loaded from environment variables.
#[derive(Debug)]
pub struct BackendConfig {
    /// Collection store location. Env vars: `PB_DATA_DIR`, `DATABASE_URL`.
    pub store: StoreConfig,
    /// TCP port for the HTTP server (default 8090). Env var: `BACKEND_PORT`.
    pub port: u16,
}

impl BackendConfig {
    pub fn from_env() -> Self {
        Self {
            store: StoreConfig::from_env(),
            port: env_parse_or("BACKEND_PORT", 8090),
        }
    }

    pub fn http_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
