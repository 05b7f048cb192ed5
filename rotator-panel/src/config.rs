//! Panel settings.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. built-in defaults
//! 2. `panel.json` in the platform config directory
//!    (`~/.config/rotator-panel/panel.json` on Linux)
//! 3. command-line options
//!
//! A missing settings file is normal. A file that cannot be parsed is
//! reported and ignored.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Action, Cli, PanelError};

pub const SETTINGS_FILE: &str = "panel.json";

pub fn get_project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "rotator", "rotator-panel")
}

/// Default location of the settings file, if the platform has a config dir
pub fn default_settings_path() -> Option<PathBuf> {
    get_project_dirs().map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
}

/// Contents of `panel.json`; every field is optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelConfig {
    /// Base HTTP URL of the hub
    pub hub: String,
    /// Path prefix of the REST API
    pub api_prefix: String,
    /// Side length of rendered compasses in pixels
    pub canvas_size: f64,
    /// Where `watch` writes its SVG files
    pub output_dir: PathBuf,
    /// Rotator `watch` shows on the azimuth compass whenever it is present
    pub azimuth_rotator: Option<String>,
    /// Rotator `watch` shows on the elevation compass whenever it is present
    pub elevation_rotator: Option<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            hub: "http://127.0.0.1:7000".to_string(),
            api_prefix: "/api".to_string(),
            canvas_size: 200.0,
            output_dir: PathBuf::from("."),
            azimuth_rotator: None,
            elevation_rotator: None,
        }
    }
}

impl PanelConfig {
    /// Read a settings file, falling back to defaults when it is absent or
    /// unreadable.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(config)) => {
                debug!("Loaded settings from {}", path.display());
                config
            }
            Ok(None) => {
                debug!("No settings file at {}", path.display());
                PanelConfig::default()
            }
            Err(e) => {
                warn!("Ignoring settings file: {}", e);
                PanelConfig::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Option<Self>, PanelError> {
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(path).map_err(|e| PanelError::Settings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| PanelError::Settings {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

/// Effective settings after all layers are applied
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub hub: String,
    pub api_prefix: String,
    pub canvas_size: f64,
    pub output_dir: PathBuf,
    pub azimuth_rotator: Option<String>,
    pub elevation_rotator: Option<String>,
}

impl Settings {
    pub fn resolve(args: &Cli) -> Result<Self, PanelError> {
        let file = match args.config.clone().or_else(default_settings_path) {
            Some(path) => PanelConfig::load(&path),
            None => PanelConfig::default(),
        };
        Self::merge(file, args)
    }

    pub fn merge(file: PanelConfig, args: &Cli) -> Result<Self, PanelError> {
        let (azimuth_rotator, elevation_rotator) = match &args.action {
            Action::Watch {
                azimuth_rotator,
                elevation_rotator,
            } => (azimuth_rotator.clone(), elevation_rotator.clone()),
            _ => (None, None),
        };
        let settings = Settings {
            hub: args.hub.clone().unwrap_or(file.hub),
            api_prefix: args.api_prefix.clone().unwrap_or(file.api_prefix),
            canvas_size: args.size.unwrap_or(file.canvas_size),
            output_dir: args.output.clone().unwrap_or(file.output_dir),
            azimuth_rotator: azimuth_rotator.or(file.azimuth_rotator),
            elevation_rotator: elevation_rotator.or(file.elevation_rotator),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), PanelError> {
        if !(self.canvas_size.is_finite() && self.canvas_size > 0.0) {
            return Err(PanelError::InvalidOption(format!(
                "canvas size must be positive, got {}",
                self.canvas_size
            )));
        }
        if !self.hub.starts_with("http://") && !self.hub.starts_with("https://") {
            return Err(PanelError::InvalidOption(format!(
                "hub must be an http:// or https:// URL, got '{}'",
                self.hub
            )));
        }
        Ok(())
    }

    /// REST base, e.g. `http://127.0.0.1:7000/api`
    pub fn api_base(&self) -> String {
        let prefix = self.api_prefix.trim_matches('/');
        let hub = self.hub.trim_end_matches('/');
        if prefix.is_empty() {
            hub.to_string()
        } else {
            format!("{}/{}", hub, prefix)
        }
    }

    /// Event stream endpoint, e.g. `ws://127.0.0.1:7000/ws`
    pub fn websocket_url(&self) -> String {
        let hub = self.hub.trim_end_matches('/');
        let base = hub
            .strip_prefix("https://")
            .map(|h| format!("wss://{}", h))
            .or_else(|| hub.strip_prefix("http://").map(|h| format!("ws://{}", h)))
            .unwrap_or_else(|| hub.to_string());
        format!("{}/ws", base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["rotator-panel"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = PanelConfig::load(&temp.path().join(SETTINGS_FILE));
        assert_eq!(config, PanelConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{"hub": "http://shack:7070", "canvasSize": 300}"#).unwrap();

        let config = PanelConfig::load(&path);
        assert_eq!(config.hub, "http://shack:7070");
        assert_eq!(config.canvas_size, 300.0);
        assert_eq!(config.api_prefix, "/api");
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(PanelConfig::load(&path), PanelConfig::default());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = PanelConfig {
            hub: "http://shack:7070".into(),
            canvas_size: 300.0,
            ..Default::default()
        };
        let args = cli(&["--size", "120", "--api-prefix", "/api/v1.0", "list"]);
        let settings = Settings::merge(file, &args).unwrap();
        assert_eq!(settings.hub, "http://shack:7070");
        assert_eq!(settings.canvas_size, 120.0);
        assert_eq!(settings.api_base(), "http://shack:7070/api/v1.0");
    }

    #[test]
    fn test_resolve_reads_explicit_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.json");
        fs::write(&path, r#"{"outputDir": "/tmp/compass"}"#).unwrap();
        let args = cli(&["--config", path.to_str().unwrap(), "watch"]);
        let settings = Settings::resolve(&args).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/compass"));
    }

    #[test]
    fn test_preferred_rotators() {
        let file = PanelConfig {
            azimuth_rotator: Some("tower".into()),
            elevation_rotator: Some("dish".into()),
            ..Default::default()
        };
        let args = cli(&["watch", "--azimuth-rotator", "mast"]);
        let settings = Settings::merge(file.clone(), &args).unwrap();
        assert_eq!(settings.azimuth_rotator.as_deref(), Some("mast"));
        assert_eq!(settings.elevation_rotator.as_deref(), Some("dish"));

        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{"elevationRotator": "dish"}"#).unwrap();
        assert_eq!(PanelConfig::load(&path).elevation_rotator.as_deref(), Some("dish"));
    }

    #[test]
    fn test_invalid_settings() {
        let args = cli(&["--size", "0", "list"]);
        assert!(Settings::merge(PanelConfig::default(), &args).is_err());
        let args = cli(&["--hub", "ftp://x", "list"]);
        assert!(Settings::merge(PanelConfig::default(), &args).is_err());
    }

    #[test]
    fn test_urls() {
        let mut settings = Settings::merge(PanelConfig::default(), &cli(&["list"])).unwrap();
        assert_eq!(settings.websocket_url(), "ws://127.0.0.1:7000/ws");
        assert_eq!(settings.api_base(), "http://127.0.0.1:7000/api");

        settings.hub = "https://hub.example/".into();
        settings.api_prefix = "".into();
        assert_eq!(settings.websocket_url(), "wss://hub.example/ws");
        assert_eq!(settings.api_base(), "https://hub.example");
    }
}
