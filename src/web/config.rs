use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::live::{LiveSettings, DEFAULT_POLL_INTERVAL, DEFAULT_TRACK_LIMIT};
use crate::map::LatLng;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub panel: PanelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8081".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_timeout", deserialize_with = "humantime_duration")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveConfig {
    #[serde(default = "default_poll_interval", deserialize_with = "humantime_duration")]
    pub poll_interval: Duration,
    #[serde(default = "default_true")]
    pub auto_refresh: bool,
    #[serde(default = "default_track_limit")]
    pub track_limit: u32,
    #[serde(default = "default_fit_padding")]
    pub fit_padding: u32,
    #[serde(default = "default_focus_zoom")]
    pub focus_zoom: u8,
    #[serde(default)]
    pub initial_view: InitialView,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            auto_refresh: true,
            track_limit: default_track_limit(),
            fit_padding: default_fit_padding(),
            focus_zoom: default_focus_zoom(),
            initial_view: InitialView::default(),
        }
    }
}

impl LiveConfig {
    pub fn settings(&self) -> LiveSettings {
        LiveSettings {
            track_limit: self.track_limit,
            fit_padding: self.fit_padding,
            focus_zoom: self.focus_zoom,
        }
    }
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

fn default_true() -> bool {
    true
}

fn default_track_limit() -> u32 {
    DEFAULT_TRACK_LIMIT
}

fn default_fit_padding() -> u32 {
    30
}

fn default_focus_zoom() -> u8 {
    15
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InitialView {
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
}

impl Default for InitialView {
    fn default() -> Self {
        Self {
            lat: -33.45,
            lon: -70.66,
            zoom: 12,
        }
    }
}

impl InitialView {
    pub fn center(&self) -> LatLng {
        LatLng::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelConfig {
    #[serde(default = "default_panel_store")]
    pub store: PathBuf,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            store: default_panel_store(),
        }
    }
}

fn default_panel_store() -> PathBuf {
    PathBuf::from("panel-state.json")
}

fn humantime_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_yaml("backend:\n  base_url: http://localhost:8000\n").unwrap();

        assert_eq!(config.web.bind, "0.0.0.0:8081");
        assert_eq!(config.backend.timeout, Duration::from_secs(10));
        assert_eq!(config.live.poll_interval, Duration::from_secs(10));
        assert!(config.live.auto_refresh);
        assert_eq!(config.live.track_limit, 100);
        assert_eq!(config.live.initial_view.zoom, 12);
        assert_eq!(config.panel.store, PathBuf::from("panel-state.json"));
    }

    #[test]
    fn durations_are_human_readable() {
        let yaml = r#"
backend:
  base_url: http://fleet.local
  timeout: 2s 500ms
live:
  poll_interval: 1m
  auto_refresh: false
  focus_zoom: 16
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.backend.timeout, Duration::from_millis(2500));
        assert_eq!(config.live.poll_interval, Duration::from_secs(60));
        assert!(!config.live.auto_refresh);
        assert_eq!(config.live.settings().focus_zoom, 16);
        assert_eq!(config.live.settings().fit_padding, 30);
    }

    #[test]
    fn bad_duration_is_rejected() {
        let yaml = "backend:\n  base_url: x\n  timeout: soon\n";
        assert!(matches!(Config::from_yaml(yaml), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn missing_backend_is_rejected() {
        assert!(Config::from_yaml("web:\n  bind: 127.0.0.1:1\n").is_err());
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet-map.yaml");
        std::fs::write(&path, "backend:\n  base_url: http://x\n").unwrap();

        assert_eq!(Config::from_file(&path).unwrap().backend.base_url, "http://x");
    }
}
