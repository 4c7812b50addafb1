//! Client side of the weather proxy

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::io::HttpClient;
use crate::weather::WeatherView;

/// Shown when the proxy reports an error without a message of its own
pub const LOCATION_NOT_FOUND_MESSAGE: &str = "Location not found.";

/// Fetches forecasts through `/api/weather` and projects them for display
pub struct WeatherClient {
    url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherClient")
            .field("url", &self.url)
            .finish()
    }
}

impl WeatherClient {
    pub fn new(dashboard_url: &str, http: Arc<dyn HttpClient>) -> Self {
        let url = format!("{}/api/weather", dashboard_url.trim_end_matches('/'));
        tracing::debug!("Created WeatherClient at {}", url);
        Self { url, http }
    }

    /// Fetch the forecast for `query`; an empty query yields the placeholder
    /// without touching the network
    pub async fn fetch(&self, query: &str, now: NaiveDateTime) -> crate::Result<WeatherView> {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!("Empty weather query, using placeholder");
            return Ok(WeatherView::space_placeholder());
        }

        let response = self.http.get(&self.url, &[("q", query)]).await?;

        if !response.is_success() {
            let message = serde_json::from_str::<Value>(&response.body)
                .ok()
                .and_then(|body| {
                    body.pointer("/details/error/message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| LOCATION_NOT_FOUND_MESSAGE.to_string());
            return Err(crate::PlantwatchError::Weather(message));
        }

        let body: Value = serde_json::from_str(&response.body)?;
        WeatherView::from_json(body, now)
    }
}
