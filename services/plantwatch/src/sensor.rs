//! Sensor sources: the board's IoT feed, or a simulated random walk

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Timelike};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::io::HttpClient;
use crate::timestamp::{self, TimestampFormat};

/// Last values reported by the sensor board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    #[serde(skip)]
    pub timestamp: NaiveDateTime,
    pub timestamp_label: String,
    pub temperature: f64,
    pub humidity: f64,
    /// Raw soil moisture indicator, displayed as reported
    pub soil: f64,
}

impl SensorReading {
    pub fn temperature_label(&self) -> String {
        format!("{:.1}°C", self.temperature)
    }

    pub fn humidity_label(&self) -> String {
        format!("{}%", self.humidity.round())
    }

    /// Parse the flat `/iot/weather` record; any missing or mistyped field rejects it
    pub fn from_feed(value: &Value) -> crate::Result<Self> {
        let raw_timestamp = value
            .get("lastTimestamp")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("lastTimestamp"))?;
        let temperature = number_field(value, "lastTemperature")?;
        let humidity = number_field(value, "lastHumidity")?;
        let soil = number_field(value, "lastSoilIndicator")?;
        let timestamp = timestamp::parse(raw_timestamp, TimestampFormat::Device)?;

        Ok(Self {
            timestamp,
            timestamp_label: raw_timestamp.trim().to_string(),
            temperature,
            humidity,
            soil,
        })
    }
}

fn number_field(value: &Value, name: &str) -> crate::Result<f64> {
    value
        .get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| malformed(name))
}

fn malformed(name: &str) -> crate::PlantwatchError {
    crate::PlantwatchError::Iot(format!("Missing or malformed field '{}'", name))
}

/// Trait for reading the latest sensor values
#[async_trait]
pub trait SensorSource: Send + Sync + std::fmt::Debug {
    /// Get the source name
    fn name(&self) -> &str;

    /// Read the most recent values
    async fn read(&self) -> crate::Result<SensorReading>;
}

/// Polls the `/iot/weather` endpoint
pub struct HttpSensorSource {
    url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for HttpSensorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSensorSource")
            .field("url", &self.url)
            .finish()
    }
}

impl HttpSensorSource {
    pub fn new(dashboard_url: &str, http: Arc<dyn HttpClient>) -> Self {
        let url = format!("{}/iot/weather", dashboard_url.trim_end_matches('/'));
        tracing::debug!("Created HttpSensorSource at {}", url);
        Self { url, http }
    }
}

#[async_trait]
impl SensorSource for HttpSensorSource {
    fn name(&self) -> &str {
        "iot"
    }

    async fn read(&self) -> crate::Result<SensorReading> {
        let response = self.http.get(&self.url, &[]).await?;
        if !response.is_success() {
            return Err(crate::PlantwatchError::Iot(format!(
                "IoT endpoint answered {}",
                response.status
            )));
        }

        let value: Value = serde_json::from_str(&response.body)?;
        SensorReading::from_feed(&value)
    }
}

/// Random walk around the last simulated values
#[derive(Debug)]
pub struct SimulatedSensorSource {
    values: Mutex<(f64, f64)>,
    soil: f64,
}

impl SimulatedSensorSource {
    pub fn new(initial_temperature: f64, initial_humidity: f64, soil: f64) -> Self {
        tracing::debug!(
            "Created SimulatedSensorSource starting at {}°C / {}%",
            initial_temperature,
            initial_humidity
        );
        Self {
            values: Mutex::new((initial_temperature, initial_humidity)),
            soil,
        }
    }
}

#[async_trait]
impl SensorSource for SimulatedSensorSource {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn read(&self) -> crate::Result<SensorReading> {
        let mut values = self.values.lock().await;
        let (temperature, humidity) = {
            let mut rng = rand::rng();
            let temperature = ((values.0 + rng.random_range(-1.0..1.0)) * 10.0).round() / 10.0;
            let humidity = (values.1 + rng.random_range(-2.0..2.0))
                .round()
                .clamp(0.0, 100.0);
            (temperature, humidity)
        };
        *values = (temperature, humidity);

        let now = chrono::Local::now().naive_local();
        let now = now.with_nanosecond(0).unwrap_or(now);

        Ok(SensorReading {
            timestamp: now,
            timestamp_label: timestamp::format(&now, TimestampFormat::Device),
            temperature,
            humidity,
            soil: self.soil,
        })
    }
}
