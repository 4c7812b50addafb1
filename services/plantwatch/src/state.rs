//! Shared dashboard context: weather, readings, chart, log and viewer

use std::sync::Arc;
use std::time::Instant;

use chrono::TimeDelta;
use rand::Rng;
use tokio::sync::RwLock;

use crate::chart::{SensorChart, DEFAULT_CHART_CAPACITY};
use crate::config::Config;
use crate::event_log::{EventLog, DEFAULT_EVENT_LOG_SIZE};
use crate::reconcile::{Connectivity, ReconcileTimestamps, DEFAULT_OFFLINE_THRESHOLD};
use crate::sensor::SensorReading;
use crate::viewer::ModelOrientation;
use crate::weather::WeatherView;

/// Sizes and thresholds the context is built with
#[derive(Debug, Clone)]
pub struct StateSettings {
    pub chart_capacity: usize,
    pub event_log_size: usize,
    pub offline_threshold: TimeDelta,
    pub query: String,
}

impl StateSettings {
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        Ok(Self {
            chart_capacity: config.dashboard.chart_capacity,
            event_log_size: config.dashboard.event_log_size,
            offline_threshold: config.poller.offline_threshold()?,
            query: config.poller.resolved_query(),
        })
    }
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            chart_capacity: DEFAULT_CHART_CAPACITY,
            event_log_size: DEFAULT_EVENT_LOG_SIZE,
            offline_threshold: DEFAULT_OFFLINE_THRESHOLD,
            query: Config::default().poller.resolved_query(),
        }
    }
}

/// Shared state accessible by poller and dashboard
#[derive(Debug)]
pub struct SharedState {
    pub weather: Option<WeatherView>,
    pub reading: Option<SensorReading>,
    pub last_sync_epoch_ms: Option<u64>,
    /// Location sent with every weather refresh
    pub query: String,
    pub timestamps: ReconcileTimestamps,
    pub connectivity: Connectivity,
    pub offline_threshold: TimeDelta,
    pub chart: SensorChart,
    pub events: EventLog,
    pub viewer: ModelOrientation,
    pub viewer_updated_at: Instant,
    pub started_at: Instant,
}

impl SharedState {
    pub fn new(settings: StateSettings) -> Self {
        let now = Instant::now();
        Self {
            weather: None,
            reading: None,
            last_sync_epoch_ms: None,
            query: settings.query,
            timestamps: ReconcileTimestamps::default(),
            connectivity: Connectivity::Unknown,
            offline_threshold: settings.offline_threshold,
            chart: SensorChart::seeded(settings.chart_capacity, &mut rand::rng()),
            events: EventLog::new(settings.event_log_size),
            viewer: ModelOrientation::default(),
            viewer_updated_at: now,
            started_at: now,
        }
    }

    /// Replace the weather card; only a real forecast moves the API timestamp
    pub fn apply_weather(&mut self, view: WeatherView) {
        if let Some(last_updated) = view.last_updated {
            self.timestamps.api = Some(last_updated);
        }
        self.weather = Some(view);
    }

    /// Take in a new reading, push it to the chart and re-check connectivity.
    /// Returns the new connectivity when it changed.
    pub fn apply_reading(&mut self, reading: SensorReading, now_ms: u64) -> Option<Connectivity> {
        self.chart.push(reading.temperature, reading.humidity);
        self.timestamps.device = Some(reading.timestamp);
        self.reading = Some(reading);
        self.last_sync_epoch_ms = Some(now_ms);
        self.events.info("New sensor data received.", now_ms);

        let connectivity = self.timestamps.connectivity(self.offline_threshold);
        if connectivity == self.connectivity {
            return None;
        }

        let previous = std::mem::replace(&mut self.connectivity, connectivity);
        match (previous, connectivity) {
            (_, Connectivity::Offline) => self.events.warn("Device connection lost.", now_ms),
            (Connectivity::Offline, Connectivity::Online) => {
                self.events.info("Device reconnected.", now_ms)
            }
            (_, Connectivity::Online) => self.events.info("Device online.", now_ms),
            (_, Connectivity::Unknown) => {}
        }
        Some(connectivity)
    }

    /// Note a failed refresh; displayed values stay as they are
    pub fn record_failure(&mut self, message: impl Into<String>, now_ms: u64) {
        self.events.warn(message, now_ms);
    }

    pub fn record_event(&mut self, message: impl Into<String>, now_ms: u64) {
        self.events.info(message, now_ms);
    }

    /// Re-seed the chart window
    pub fn reset_chart<R: Rng>(&mut self, rng: &mut R) {
        self.chart.reset(rng);
    }

    /// Bring the viewer's idle spin up to `now`; no spin while dragging
    pub fn sync_viewer(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.viewer_updated_at);
        self.viewer_updated_at = now;
        if !self.viewer.is_dragging() {
            self.viewer.advance(elapsed);
        }
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle(settings: StateSettings) -> StateHandle {
    Arc::new(RwLock::new(SharedState::new(settings)))
}
