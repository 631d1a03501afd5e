use std::path::PathBuf;

use crate::focus::DEFAULT_FOCUS_LIMIT;
use crate::heatmap::DEFAULT_WINDOW_DAYS;

const DEFAULT_DB_NAME: &str = "aura.db";
const DEFAULT_OWNER: &str = "local";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub owner: String,
    pub focus_limit: usize,
    pub heatmap_days: usize,
}

impl Config {
    /// Environment first (`AURA_DB`, `AURA_OWNER`), then defaults. A
    /// command-line owner overrides both.
    pub fn load(owner: Option<String>) -> Self {
        Self {
            db_path: db_path(),
            owner: owner
                .or_else(|| std::env::var("AURA_OWNER").ok())
                .filter(|o| !o.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_OWNER.to_string()),
            focus_limit: DEFAULT_FOCUS_LIMIT,
            heatmap_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

fn db_path() -> PathBuf {
    if let Ok(path) = std::env::var("AURA_DB") {
        return PathBuf::from(path);
    }

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aura");

    std::fs::create_dir_all(&config_dir).ok();
    config_dir.join(DEFAULT_DB_NAME)
}
