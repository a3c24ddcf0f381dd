//! Runtime configuration read from the environment.

use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 9999;
const DEFAULT_STORAGE_DIR: &str = "pdf_storage";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory all generated PDFs are written to.
    pub storage_dir: PathBuf,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Load from the process environment after reading an optional `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Unset or empty values use defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match get("SERVER_PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "SERVER_PORT",
                expected: "port number",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            host: get("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            storage_dir: get("PDF_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR)),
            allowed_origins,
        })
    }
}
