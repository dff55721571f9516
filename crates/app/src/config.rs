//! Settings location and persistence.

use anyhow::{Context, Result};
use shared::settings::AppSettings;
use std::path::PathBuf;

pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com.local", "Agent Chat", "AgentChat")
        .map(|proj| proj.config_dir().join("settings.json"))
}

/// Settings from disk (defaults when absent) with environment overrides applied.
pub fn load_settings() -> AppSettings {
    let settings = match config_path() {
        Some(path) => AppSettings::load_from(&path),
        None => {
            tracing::warn!("no config directory available, using defaults");
            AppSettings::default()
        }
    };
    settings.with_env_overrides()
}

pub fn save_settings(settings: &AppSettings) -> Result<()> {
    let path = config_path().context("no config directory available")?;
    settings
        .save_to(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!("settings saved to {}", path.display());
    Ok(())
}
