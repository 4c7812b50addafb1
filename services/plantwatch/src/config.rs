//! Configuration types for the plantwatch service

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable consulted when no API key is configured
pub const WEATHER_API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub weather_api: WeatherApiConfig,
    #[serde(default)]
    pub iot: IotConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

/// Upstream weather API used by the proxy endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherApiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<PathBuf>,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_file: None,
            base_url: default_weather_base_url(),
            forecast_days: default_forecast_days(),
        }
    }
}

/// Sensor history file served by the IoT endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IotConfig {
    #[serde(default = "default_iot_data_file")]
    pub data_file: PathBuf,
}

impl Default for IotConfig {
    fn default() -> Self {
        Self {
            data_file: default_iot_data_file(),
        }
    }
}

/// Where sensor readings come from, tagged for extensibility
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SensorSourceConfig {
    #[default]
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "simulated")]
    Simulated {
        #[serde(default = "default_simulated_temperature")]
        initial_temperature: f64,
        #[serde(default = "default_simulated_humidity")]
        initial_humidity: f64,
        #[serde(default)]
        soil: f64,
    },
}

/// Geographic position used instead of a free-text query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Polling loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    #[serde(default)]
    pub source: SensorSourceConfig,
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_chart_reset_interval")]
    pub chart_reset_interval_seconds: u64,
    #[serde(default = "default_offline_threshold")]
    pub offline_threshold_minutes: i64,
    /// Base URL of the proxy the poller talks to; defaults to this service
    #[serde(default)]
    pub dashboard_url: Option<String>,
}

impl PollerConfig {
    /// The weather query sent on every poll: coordinates win over free text
    pub fn resolved_query(&self) -> String {
        match self.coordinates {
            Some(Coordinates {
                latitude,
                longitude,
            }) => format!("{},{}", latitude, longitude),
            None => self.query.clone(),
        }
    }

    /// Maximum gap between the API and device timestamps before the device
    /// counts as offline
    pub fn offline_threshold(&self) -> crate::Result<TimeDelta> {
        match TimeDelta::try_minutes(self.offline_threshold_minutes) {
            Some(threshold) if threshold >= TimeDelta::zero() => Ok(threshold),
            _ => Err(crate::PlantwatchError::Config(format!(
                "offline_threshold_minutes must be between 0 and {}, got {}",
                i64::MAX / 60_000,
                self.offline_threshold_minutes
            ))),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            source: SensorSourceConfig::default(),
            query: default_query(),
            coordinates: None,
            poll_interval_seconds: default_poll_interval(),
            chart_reset_interval_seconds: default_chart_reset_interval(),
            offline_threshold_minutes: default_offline_threshold(),
            dashboard_url: None,
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    #[serde(default = "default_event_log_size")]
    pub event_log_size: usize,
    #[serde(default = "default_chart_capacity")]
    pub chart_capacity: usize,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
            event_log_size: default_event_log_size(),
            chart_capacity: default_chart_capacity(),
            static_dir: default_static_dir(),
        }
    }
}

/// 3D viewer scene settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default = "default_texture_path")]
    pub texture_path: String,
    #[serde(default = "default_mesh_name")]
    pub mesh_name: String,
    #[serde(default = "default_model_scale")]
    pub scale: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            texture_path: default_texture_path(),
            mesh_name: default_mesh_name(),
            scale: default_model_scale(),
        }
    }
}

impl Config {
    /// Reject values the service cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        self.poller.offline_threshold()?;
        Ok(())
    }

    /// Fill in the weather API key from `api_key_file` or the environment
    pub fn resolve_secrets(&mut self) -> crate::Result<()> {
        if self.weather_api.api_key.is_some() {
            return Ok(());
        }

        if let Some(path) = &self.weather_api.api_key_file {
            let key = std::fs::read_to_string(path).map_err(|e| {
                crate::PlantwatchError::Config(format!(
                    "Failed to read API key file {:?}: {}",
                    path, e
                ))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(crate::PlantwatchError::Config(format!(
                    "API key file {:?} is empty",
                    path
                )));
            }
            self.weather_api.api_key = Some(key.to_string());
            return Ok(());
        }

        match std::env::var(WEATHER_API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => {
                self.weather_api.api_key = Some(key.trim().to_string());
            }
            _ => {
                tracing::warn!(
                    "No weather API key configured; /api/weather will answer with an error"
                );
            }
        }
        Ok(())
    }

    /// Base URL the poller uses to reach the proxy endpoints
    pub fn dashboard_url(&self) -> String {
        self.poller
            .dashboard_url
            .clone()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", self.dashboard.port))
    }
}

fn default_weather_base_url() -> String {
    "http://api.weatherapi.com/v1/forecast.json".to_string()
}

fn default_forecast_days() -> u8 {
    1
}

fn default_iot_data_file() -> PathBuf {
    PathBuf::from("iot_data.json")
}

fn default_simulated_temperature() -> f64 {
    22.0
}

fn default_simulated_humidity() -> f64 {
    60.0
}

fn default_query() -> String {
    "Wroclaw".to_string()
}

fn default_poll_interval() -> u64 {
    30
}

fn default_chart_reset_interval() -> u64 {
    3600
}

fn default_offline_threshold() -> i64 {
    15
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    5000
}

fn default_event_log_size() -> usize {
    crate::event_log::DEFAULT_EVENT_LOG_SIZE
}

fn default_chart_capacity() -> usize {
    crate::chart::DEFAULT_CHART_CAPACITY
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_model_path() -> String {
    "/static/models/DHT22.fbx".to_string()
}

fn default_texture_path() -> String {
    "/static/models/textures/IMG-1477.jpg".to_string()
}

fn default_mesh_name() -> String {
    "DHT22".to_string()
}

fn default_model_scale() -> f64 {
    13.0
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::PlantwatchError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "weather_api": {
                "api_key": "secret",
                "base_url": "http://fake-weather.test/v1/forecast.json",
                "forecast_days": 2
            },
            "iot": {
                "data_file": "/var/lib/plantwatch/iot.json"
            },
            "poller": {
                "source": {"type": "simulated", "initial_temperature": 19.5, "soil": 1},
                "query": "Berlin",
                "coordinates": {"latitude": 51.1, "longitude": 17.03},
                "poll_interval_seconds": 10,
                "chart_reset_interval_seconds": 600,
                "offline_threshold_minutes": 5,
                "dashboard_url": "http://dashboard.local:8080"
            },
            "dashboard": {
                "enabled": false,
                "port": 8080,
                "event_log_size": 8,
                "chart_capacity": 24,
                "static_dir": "/srv/static"
            },
            "viewer": {
                "model_path": "/static/models/board.fbx",
                "scale": 2.5
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.weather_api.api_key.as_deref(), Some("secret"));
        assert_eq!(config.weather_api.forecast_days, 2);
        assert_eq!(
            config.iot.data_file,
            PathBuf::from("/var/lib/plantwatch/iot.json")
        );
        assert_eq!(
            config.poller.source,
            SensorSourceConfig::Simulated {
                initial_temperature: 19.5,
                initial_humidity: 60.0,
                soil: 1.0,
            }
        );
        assert_eq!(config.poller.query, "Berlin");
        assert_eq!(config.poller.resolved_query(), "51.1,17.03");
        assert_eq!(config.poller.poll_interval_seconds, 10);
        assert_eq!(config.poller.chart_reset_interval_seconds, 600);
        assert_eq!(config.poller.offline_threshold_minutes, 5);
        assert_eq!(config.dashboard_url(), "http://dashboard.local:8080");
        assert!(!config.dashboard.enabled);
        assert_eq!(config.dashboard.port, 8080);
        assert_eq!(config.dashboard.event_log_size, 8);
        assert_eq!(config.dashboard.chart_capacity, 24);
        assert_eq!(config.viewer.model_path, "/static/models/board.fbx");
        assert_eq!(config.viewer.mesh_name, "DHT22");
        assert_eq!(config.viewer.scale, 2.5);
    }

    #[test]
    fn parse_minimal_config() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert!(config.weather_api.api_key.is_none());
        assert_eq!(
            config.weather_api.base_url,
            "http://api.weatherapi.com/v1/forecast.json"
        );
        assert_eq!(config.weather_api.forecast_days, 1);
        assert_eq!(config.iot.data_file, PathBuf::from("iot_data.json"));
        assert_eq!(config.poller.source, SensorSourceConfig::Http);
        assert_eq!(config.poller.resolved_query(), "Wroclaw");
        assert_eq!(config.poller.poll_interval_seconds, 30);
        assert_eq!(config.poller.chart_reset_interval_seconds, 3600);
        assert_eq!(config.poller.offline_threshold_minutes, 15);
        assert!(config.dashboard.enabled);
        assert_eq!(config.dashboard.port, 5000);
        assert_eq!(config.dashboard.event_log_size, 5);
        assert_eq!(config.dashboard.chart_capacity, 12);
        assert_eq!(config.dashboard_url(), "http://127.0.0.1:5000");
        assert_eq!(config.viewer.scale, 13.0);
    }

    #[test]
    fn parse_http_source() {
        let json = r#"{"poller": {"source": {"type": "http"}}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.poller.source, SensorSourceConfig::Http);
    }

    #[test]
    fn resolve_secrets_keeps_configured_key() {
        let mut config = Config::default();
        config.weather_api.api_key = Some("inline".to_string());
        config.resolve_secrets().unwrap();
        assert_eq!(config.weather_api.api_key.as_deref(), Some("inline"));
    }

    #[test]
    fn resolve_secrets_reads_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("weather.key");
        std::fs::write(&key_path, "from-file\n").unwrap();

        let mut config = Config::default();
        config.weather_api.api_key_file = Some(key_path);
        config.resolve_secrets().unwrap();
        assert_eq!(config.weather_api.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn resolve_secrets_rejects_missing_key_file() {
        let mut config = Config::default();
        config.weather_api.api_key_file = Some(PathBuf::from("/nonexistent/weather.key"));
        let err = config.resolve_secrets().unwrap_err();
        assert!(err.to_string().contains("Failed to read API key file"));
    }

    #[test]
    fn resolve_secrets_rejects_empty_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("weather.key");
        std::fs::write(&key_path, "  \n").unwrap();

        let mut config = Config::default();
        config.weather_api.api_key_file = Some(key_path);
        assert!(config.resolve_secrets().is_err());
    }

    #[test]
    fn load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/config.json"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"poller": {"query": "Gdansk"}}"#).unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.poller.query, "Gdansk");
    }

    #[test]
    fn load_config_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "not json").unwrap();

        let result = load_config(&config_path);
        assert!(result.is_err());
    }

    #[test]
    fn offline_threshold_in_minutes() {
        let config = PollerConfig {
            offline_threshold_minutes: 5,
            ..PollerConfig::default()
        };
        assert_eq!(config.offline_threshold().unwrap(), TimeDelta::minutes(5));
    }

    #[test]
    fn offline_threshold_out_of_range_is_rejected() {
        for minutes in [-1, i64::MAX, i64::MIN] {
            let config = PollerConfig {
                offline_threshold_minutes: minutes,
                ..PollerConfig::default()
            };
            let err = config.offline_threshold().unwrap_err();
            assert!(err.to_string().contains("offline_threshold_minutes"));
        }
    }

    #[test]
    fn load_config_rejects_negative_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"poller": {"offline_threshold_minutes": -5}}"#,
        )
        .unwrap();

        let err = load_config(&config_path).unwrap_err();
        assert!(matches!(err, crate::PlantwatchError::Config(_)));
    }

    #[test]
    fn example_config_parses() {
        let config: Config = serde_json::from_str(include_str!("../config.example.json")).unwrap();
        assert_eq!(config.dashboard.port, 5000);
        assert_eq!(config.poller.source, SensorSourceConfig::Http);
        assert!(config.weather_api.api_key.is_none());
    }
}
