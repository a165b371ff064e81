mod config;

pub use config::{Config, CycleSettings, NotificationsConfig, PhaseConfig, ScheduleConfig};

use std::path::PathBuf;

/// Returns `<config dir>/tomato[-dev]/` based on TOMATO_ENV, where the
/// config dir is `$XDG_CONFIG_HOME` or `~/.config` on Linux.
///
/// Set TOMATO_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if the platform config directory cannot be determined
/// or creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::config_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "cannot determine the user config directory",
        )
    })?;

    let env = std::env::var("TOMATO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("tomato-dev")
    } else {
        base_dir.join("tomato")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
