//! Settings for the bootstrap
//!
//! Read from a JSON file; the bootstrap never writes it.
//! Uses separate directories for production and test builds:
//! - Linux/macOS Production: ~/.config/localnode/settings.json
//! - Linux/macOS Test/Debug: ~/.config/localnode-test/settings.json
//! - Windows Production: %APPDATA%\localnode\settings.json
//! - Windows Test/Debug: %APPDATA%\localnode-test\settings.json

use crate::error::SettingsError;
use crate::runtime::{Point, Size};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Initial window geometry and behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowSettings {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_x")]
    pub x: i32,
    #[serde(default = "default_y")]
    pub y: i32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(rename = "quitOnClose", default = "default_quit_on_close")]
    pub quit_on_close: bool,
}

fn default_title() -> String {
    "localnode".to_string()
}

fn default_x() -> i32 {
    10
}

fn default_y() -> i32 {
    10
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_quit_on_close() -> bool {
    true
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            x: default_x(),
            y: default_y(),
            width: default_width(),
            height: default_height(),
            quit_on_close: default_quit_on_close(),
        }
    }
}

impl WindowSettings {
    pub fn origin(&self) -> Point {
        Point { x: self.x, y: self.y }
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Settings {
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Get the settings file path based on the platform and build profile.
fn get_settings_file_path() -> Result<PathBuf, SettingsError> {
    #[cfg(production)]
    let app_name = "localnode";

    #[cfg(not(production))]
    let app_name = "localnode-test";

    let proj_dirs = ProjectDirs::from("", "", app_name).ok_or(SettingsError::NoConfigDir)?;

    Ok(proj_dirs.config_dir().join("settings.json"))
}

/// Load settings from a specific file. A missing file yields defaults.
pub fn load_settings_from(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load settings from the platform settings file
pub fn load_settings() -> Result<Settings, SettingsError> {
    load_settings_from(&get_settings_file_path()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_settings(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.window.title, "localnode");
        assert_eq!(settings.window.origin(), Point { x: 10, y: 10 });
        assert_eq!(settings.window.size(), Size { width: 1280, height: 720 });
        assert!(settings.window.quit_on_close);
        assert_eq!(settings.logging.level, "warn");
        assert_eq!(settings.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let file = write_settings(r#"{ "window": { "width": 800, "quitOnClose": false }, "logging": { "format": "json" } }"#);
        let settings = load_settings_from(file.path()).unwrap();

        assert_eq!(settings.window.width, 800);
        assert_eq!(settings.window.height, 720);
        assert!(!settings.window.quit_on_close);
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn test_invalid_file_reports_parse_error() {
        let file = write_settings("{ not json");
        let err = load_settings_from(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }), "unexpected error: {err}");
    }

    #[test]
    fn test_config_directory_path() {
        let path = match get_settings_file_path() {
            Ok(path) => path,
            // Sandboxed CI without a home directory
            Err(SettingsError::NoConfigDir) => return,
            Err(e) => panic!("unexpected error: {e}"),
        };

        assert!(path.to_string_lossy().ends_with("settings.json"));

        let path_str = path.to_string_lossy();
        #[cfg(production)]
        assert!(
            path_str.contains("localnode") && !path_str.contains("localnode-test"),
            "Production build should use 'localnode' directory, got: {}",
            path_str
        );

        #[cfg(not(production))]
        assert!(
            path_str.contains("localnode-test"),
            "Debug build should use 'localnode-test' directory, got: {}",
            path_str
        );
    }
}
