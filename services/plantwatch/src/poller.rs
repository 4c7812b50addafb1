//! Poller: refreshes weather and sensor readings into the shared state

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;

use crate::config::PollerConfig;
use crate::sensor::SensorSource;
use crate::state::StateHandle;
use crate::weather::WeatherView;
use crate::weather_client::WeatherClient;

/// Periodically refreshes the dashboard context
pub struct Poller {
    weather: Arc<WeatherClient>,
    source: Arc<dyn SensorSource>,
    state: StateHandle,
    poll_interval: Duration,
    chart_reset_interval: Duration,
    cancel: CancellationToken,
}

impl Poller {
    pub fn new(
        weather: Arc<WeatherClient>,
        source: Arc<dyn SensorSource>,
        config: &PollerConfig,
        state: StateHandle,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            weather,
            source,
            state,
            poll_interval: Duration::from_secs(config.poll_interval_seconds),
            chart_reset_interval: Duration::from_secs(config.chart_reset_interval_seconds),
            cancel,
        }
    }

    /// Refresh weather, then sensors. Failures only reach the event log.
    pub async fn poll_once(&self) {
        if let Err(e) = refresh_weather(&self.weather, &self.state).await {
            tracing::debug!("Keeping previous weather: {}", e);
        }
        refresh_sensors(self.source.as_ref(), &self.state).await;
    }

    /// Poll until the cancellation token is triggered
    pub async fn run(&self) {
        let mut chart_reset =
            tokio::time::interval(self.chart_reset_interval.max(Duration::from_secs(1)));
        // the first tick completes immediately
        chart_reset.tick().await;

        loop {
            self.poll_once().await;

            let sleep = tokio::time::sleep(self.poll_interval);
            tokio::pin!(sleep);

            loop {
                tokio::select! {
                    _ = &mut sleep => break,
                    _ = chart_reset.tick() => {
                        tracing::info!("Resetting sensor chart");
                        self.state.write().await.reset_chart(&mut rand::rng());
                    }
                    _ = self.cancel.cancelled() => {
                        tracing::debug!("Polling loop cancelled");
                        return;
                    }
                }
            }
        }
    }
}

/// Fetch the forecast for the context's current query and store it
pub async fn refresh_weather(
    client: &WeatherClient,
    state: &StateHandle,
) -> crate::Result<WeatherView> {
    let query = state.read().await.query.clone();
    fetch_weather(client, state, &query).await
}

/// Switch the dashboard to a new location. The query is kept only when the
/// fetch succeeds; an empty search shows the placeholder once and polling
/// stays on the previous location.
pub async fn search(
    client: &WeatherClient,
    state: &StateHandle,
    query: &str,
) -> crate::Result<WeatherView> {
    let view = fetch_weather(client, state, query).await?;
    let query = query.trim();
    if !query.is_empty() {
        state.write().await.query = query.to_string();
    }
    Ok(view)
}

async fn fetch_weather(
    client: &WeatherClient,
    state: &StateHandle,
    query: &str,
) -> crate::Result<WeatherView> {
    let now = chrono::Local::now().naive_local();
    match client.fetch(query, now).await {
        Ok(view) => {
            tracing::debug!("Weather for '{}' updated", view.location);
            state.write().await.apply_weather(view.clone());
            Ok(view)
        }
        Err(e) => {
            tracing::warn!("Weather refresh for '{}' failed: {}", query, e);
            state
                .write()
                .await
                .record_failure(format!("Weather update failed: {}", e), current_epoch_ms());
            Err(e)
        }
    }
}

/// Read the sensor source once and store the reading
pub async fn refresh_sensors(source: &dyn SensorSource, state: &StateHandle) {
    let now_ms = current_epoch_ms();
    match source.read().await {
        Ok(reading) => {
            tracing::debug!(
                "Reading from '{}': {} / {} at {}",
                source.name(),
                reading.temperature_label(),
                reading.humidity_label(),
                reading.timestamp_label
            );
            let change = state.write().await.apply_reading(reading, now_ms);
            if let Some(connectivity) = change {
                tracing::info!("Device is now {}", connectivity);
            }
        }
        Err(e) => {
            tracing::warn!("Sensor read from '{}' failed: {}", source.name(), e);
            state
                .write()
                .await
                .record_failure(format!("Sensor update failed: {}", e), now_ms);
        }
    }
}

pub fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
