//! Settings loaded from `tools/project.ini`.

use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing::{debug, info};

use crate::core::settings::{Required, SettingKey, Settings, parse_settings};
use crate::error::LaunchError;

/// Load settings from `path` and check every entry in `required`.
///
/// A missing file is [`LaunchError::ConfigMissing`]; an unmet requirement is
/// [`LaunchError::ConfigKeyMissing`].
pub fn load_settings(path: &Path, required: &[Required]) -> Result<Settings> {
    if !path.exists() {
        return Err(LaunchError::ConfigMissing {
            path: path.to_path_buf(),
        }
        .into());
    }
    info!(path = %path.display(), "reading config file");
    let contents = fs::read_to_string(path)
        .map_err(|err| LaunchError::filesystem("read config file", path, err))?;
    let settings = parse_settings(&contents);

    if let Some(key) = settings.first_missing(required) {
        return Err(LaunchError::ConfigKeyMissing {
            path: path.to_path_buf(),
            key: key.as_str(),
        }
        .into());
    }

    debug!(?settings, "config loaded");
    Ok(settings)
}

/// Log the effective settings, one per line, in key order.
pub fn log_settings(settings: &Settings) {
    info!("config loaded:");
    for key in SettingKey::ALL {
        let value = match key {
            SettingKey::ToolMode => settings.tool_mode(),
            SettingKey::ShowLogs => settings.get(key).unwrap_or("false"),
            _ => settings.get_or_empty(key),
        };
        info!("  {key} = {value}");
    }
}
