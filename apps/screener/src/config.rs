use std::path::PathBuf;

use anyhow::{bail, Result};

/// Application configuration loaded from environment variables (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    /// Checked on the first inference request, so `status` and skipped
    /// stages run without it.
    pub anthropic_api_key: Option<String>,
    pub prompts_dir: PathBuf,
    /// Absolute anchor for identity slugs. `None` means identities are full
    /// absolute paths.
    pub root: Option<PathBuf>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let root = var("SCREENER_ROOT").map(PathBuf::from);
        if let Some(root) = &root {
            if !root.is_absolute() {
                bail!("SCREENER_ROOT '{}' must be an absolute path", root.display());
            }
            if !root.is_dir() {
                bail!("SCREENER_ROOT '{}' is not a directory", root.display());
            }
        }

        Ok(Config {
            anthropic_api_key: var("ANTHROPIC_API_KEY"),
            prompts_dir: var("SCREENER_PROMPTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("prompts")),
            root,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
