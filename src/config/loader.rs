//! Configuration loading from file system

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use super::types::{default_config_path, Config};

/// Load configuration from `path`, or from `~/.hotkey-kit/config.json`.
///
/// Returns Config::default() if the file is missing, unreadable, malformed
/// or fails validation.
#[instrument(name = "load_config")]
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path: PathBuf = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    if !config_path.exists() {
        info!(path = %config_path.display(), "Config file not found, using defaults");
        return Config::default();
    }

    let contents = match fs::read_to_string(&config_path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(path = %config_path.display(), error = %e, "Failed to read config, using defaults");
            return Config::default();
        }
    };

    let config = match serde_json::from_str::<Config>(&contents) {
        Ok(config) => config,
        Err(e) => {
            // Provide helpful error message for common config mistakes
            let error_hint = if e.to_string().contains("expected a character") {
                "\n\nHint: 'separator' must be a single character, e.g. \"separator\": \";\""
            } else if e.to_string().contains("idRange") || e.to_string().contains("u16") {
                "\n\nHint: 'idRange' bounds must be integers between 0 and 65535"
            } else {
                ""
            };
            warn!(
                path = %config_path.display(),
                error = %e,
                hint = %error_hint,
                "Failed to parse config JSON, using defaults"
            );
            return Config::default();
        }
    };

    if let Err(e) = config.validate() {
        warn!(path = %config_path.display(), error = %e, "Invalid config, using defaults");
        return Config::default();
    }

    info!(path = %config_path.display(), "Successfully loaded config");
    config
}
