//! Backend proxy in front of the upstream weather API
//!
//! Keeps the API key on the server. The browser and the poller only ever see
//! `/api/weather?q=...`.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::WeatherApiConfig;
use crate::io::HttpClient;

pub const MISSING_API_KEY_MESSAGE: &str = "Weather API key is not configured on the server.";
pub const MISSING_QUERY_MESSAGE: &str = "Parameter 'q' (city or lat,lon) is required.";
pub const UPSTREAM_ERROR_MESSAGE: &str = "Weather API returned an error.";
pub const UPSTREAM_UNREACHABLE_MESSAGE: &str = "Could not connect to the weather API.";

/// Status code and JSON body to hand back to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub status: u16,
    pub body: Value,
}

impl ProxyResponse {
    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    fn error_with_details(status: u16, message: &str, details: Value) -> Self {
        Self {
            status,
            body: json!({ "error": message, "details": details }),
        }
    }
}

/// Forwards forecast queries to the upstream API
pub struct WeatherProxy {
    api_key: Option<String>,
    base_url: String,
    forecast_days: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for WeatherProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherProxy")
            .field("base_url", &self.base_url)
            .field("api_key_configured", &self.api_key.is_some())
            .finish()
    }
}

impl WeatherProxy {
    pub fn new(config: &WeatherApiConfig, http: Arc<dyn HttpClient>) -> Self {
        tracing::debug!("Created WeatherProxy for {}", config.base_url);

        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            forecast_days: config.forecast_days.to_string(),
            http,
        }
    }

    /// Answer one `/api/weather` request
    pub async fn forecast(&self, query: Option<&str>) -> ProxyResponse {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::error!("Weather API key has not been configured on the server");
            return ProxyResponse::error(500, MISSING_API_KEY_MESSAGE);
        };

        let query = match query.map(str::trim) {
            Some(q) if !q.is_empty() => q,
            _ => {
                tracing::error!("Query parameter 'q' is required");
                return ProxyResponse::error(400, MISSING_QUERY_MESSAGE);
            }
        };

        let params = [
            ("key", api_key),
            ("q", query),
            ("days", self.forecast_days.as_str()),
            ("aqi", "no"),
            ("alerts", "no"),
        ];

        match self.http.get(&self.base_url, &params).await {
            Ok(response) if response.is_success() => {
                match serde_json::from_str::<Value>(&response.body) {
                    Ok(data) => {
                        tracing::info!("Weather data for '{}' downloaded", query);
                        ProxyResponse {
                            status: 200,
                            body: data,
                        }
                    }
                    Err(e) => {
                        tracing::error!("Weather API sent invalid JSON: {}", e);
                        ProxyResponse::error_with_details(
                            502,
                            UPSTREAM_ERROR_MESSAGE,
                            Value::String(e.to_string()),
                        )
                    }
                }
            }
            Ok(response) => {
                tracing::error!(
                    "Weather API answered {} for '{}': {}",
                    response.status,
                    query,
                    response.body
                );
                let details = serde_json::from_str::<Value>(&response.body)
                    .unwrap_or(Value::String(response.body));
                ProxyResponse::error_with_details(response.status, UPSTREAM_ERROR_MESSAGE, details)
            }
            Err(e) => {
                tracing::error!("Weather API unreachable: {}", e);
                ProxyResponse::error_with_details(
                    503,
                    UPSTREAM_UNREACHABLE_MESSAGE,
                    Value::String(e.to_string()),
                )
            }
        }
    }
}
