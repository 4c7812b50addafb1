//! IoT feed backed by the sensor board's JSON history file

use std::path::{Path, PathBuf};

use serde_json::{json, Value};

pub const LOAD_FAILED_MESSAGE: &str = "Unable to load data";
pub const NOT_A_LIST_MESSAGE: &str = "JSON file does not contain a list";

/// Reads the history file written by the sensor board
#[derive(Debug, Clone)]
pub struct IotStore {
    data_file: PathBuf,
}

/// Status code and JSON body for `/iot/weather`
#[derive(Debug, Clone, PartialEq)]
pub struct IotResponse {
    pub status: u16,
    pub body: Value,
}

impl IotStore {
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
        }
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Parse the history file; `None` when it cannot be read or parsed
    pub async fn load(&self) -> Option<Value> {
        let content = match tokio::fs::read_to_string(&self.data_file).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!("No {:?} file", self.data_file);
                return None;
            }
            Err(e) => {
                tracing::error!("Failed to read {:?}: {}", self.data_file, e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => {
                tracing::debug!("Loaded {:?}", self.data_file);
                Some(value)
            }
            Err(e) => {
                tracing::error!("Parse error in {:?}: {}", self.data_file, e);
                None
            }
        }
    }

    /// Answer one `/iot/weather` request with a summary of the last record
    pub async fn summary(&self) -> IotResponse {
        let Some(data) = self.load().await else {
            return IotResponse {
                status: 500,
                body: json!({ "status": "error", "message": LOAD_FAILED_MESSAGE }),
            };
        };

        let (last, length) = match data.as_array() {
            Some(records) if !records.is_empty() => {
                (records[records.len() - 1].clone(), records.len())
            }
            _ => {
                tracing::error!("{:?} does not contain a list", self.data_file);
                return IotResponse {
                    status: 404,
                    body: json!({ "status": "error", "message": NOT_A_LIST_MESSAGE }),
                };
            }
        };

        let field = |name: &str| last.get(name).cloned().unwrap_or(Value::Null);

        tracing::info!(
            "Timestamp: {}, Temp: {}°C, Humidity: {}%, Soil: {}, Total: {}",
            display_value(&field("timestamp")),
            display_value(&field("temperature")),
            display_value(&field("humidity")),
            display_value(&field("soil")),
            length
        );

        IotResponse {
            status: 200,
            body: json!({
                "allReceived": data,
                "lastTimestamp": field("timestamp"),
                "lastTemperature": field("temperature"),
                "lastHumidity": field("humidity"),
                "lastSoilIndicator": field("soil"),
                "lastRecord": last,
                "length": length,
            }),
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
