use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::model::DEFAULT_WINDOW_DAYS;

#[derive(Debug, Clone)]
pub struct Config {
    pub window_days: u32,
    pub store_path: PathBuf,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            window_days: env::var("WTB_WINDOW_DAYS")
                .unwrap_or_else(|_| DEFAULT_WINDOW_DAYS.to_string())
                .parse()
                .context("Invalid WTB_WINDOW_DAYS")?,
            store_path: env::var("WTB_STORE")
                .unwrap_or_else(|_| "wtb_tracker.json".to_string())
                .into(),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
