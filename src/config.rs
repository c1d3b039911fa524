use crate::error::{AppError, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub dataset: DatasetConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub dir: PathBuf,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

        let dir = std::env::var("DATASET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("dataset"));

        Ok(Self {
            server: ServerConfig { host, port },
            dataset: DatasetConfig { dir },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        // Only assert the compiled-in fallbacks that no test sets.
        let config = AppConfig::new().unwrap();
        assert!(!config.server.host.is_empty());
        assert!(config.server.port > 0);
        assert!(!config.dataset.dir.as_os_str().is_empty());
    }
}
