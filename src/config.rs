use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dotenvy::dotenv;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_file: PathBuf,
    pub host: String,
    pub port: u16,
    /// Maximum number of rows returned in the `analyze` table.
    pub table_limit: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            data_file: env::var("DATA_FILE")
                .unwrap_or_else(|_| "dataset/sampledata.csv".to_string())
                .into(),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            table_limit: env::var("TABLE_LIMIT")
                .unwrap_or_else(|_| "200".to_string())
                .parse()
                .context("TABLE_LIMIT must be a non-negative integer")?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
