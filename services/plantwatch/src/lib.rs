//! Plantwatch - weather and plant sensor dashboard
//!
//! Proxies forecasts from the weather API, serves the sensor board's history,
//! and keeps a dashboard context that reconciles both sources into a device
//! connectivity status.

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod event_log;
pub mod io;
pub mod iot;
pub mod poller;
pub mod proxy;
pub mod reconcile;
pub mod sensor;
pub mod state;
pub mod timestamp;
pub mod viewer;
pub mod weather;
pub mod weather_client;

pub use config::{load_config, Config};
pub use error::{PlantwatchError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::SensorSourceConfig;
use crate::dashboard::DashboardState;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::iot::IotStore;
use crate::poller::Poller;
use crate::proxy::WeatherProxy;
use crate::sensor::{HttpSensorSource, SensorSource, SimulatedSensorSource};
use crate::state::StateSettings;
use crate::viewer::ViewerScene;
use crate::weather_client::WeatherClient;

/// Build the configured sensor source
pub fn build_sensor_source(config: &Config, http: Arc<dyn HttpClient>) -> Arc<dyn SensorSource> {
    match &config.poller.source {
        SensorSourceConfig::Http => Arc::new(HttpSensorSource::new(&config.dashboard_url(), http)),
        SensorSourceConfig::Simulated {
            initial_temperature,
            initial_humidity,
            soil,
        } => Arc::new(SimulatedSensorSource::new(
            *initial_temperature,
            *initial_humidity,
            *soil,
        )),
    }
}

/// Run the plantwatch service with the given configuration
pub async fn run(config: Config) -> Result<()> {
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::default());
    let cancel = CancellationToken::new();

    let state = state::new_state_handle(StateSettings::from_config(&config)?);
    let weather = Arc::new(WeatherClient::new(&config.dashboard_url(), Arc::clone(&http)));
    let source = build_sensor_source(&config, Arc::clone(&http));
    tracing::debug!("Sensor source: {}", source.name());

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    // Start dashboard if enabled
    if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let dashboard_state = DashboardState {
            state: Arc::clone(&state),
            proxy: Arc::new(WeatherProxy::new(&config.weather_api, Arc::clone(&http))),
            iot: Arc::new(IotStore::new(config.iot.data_file.clone())),
            weather: Arc::clone(&weather),
            scene: Arc::new(ViewerScene::from_config(&config.viewer)),
            static_dir: config.dashboard.static_dir.clone(),
        };
        let cancel_for_dashboard = cancel.clone();

        tokio::spawn(async move {
            let router = dashboard::build_router(dashboard_state);
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
            tracing::info!("Dashboard listening on http://{}", addr);

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        dashboard_port,
                        e
                    );
                    return;
                }
            };

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        });
    }

    state
        .write()
        .await
        .record_event("Dashboard initialized successfully.", poller::current_epoch_ms());
    tracing::info!("Dashboard initialized successfully.");

    // Poll until cancelled
    let poller = Poller::new(weather, source, &config.poller, state, cancel.clone());
    poller.run().await;
    tracing::info!("Plantwatch stopped");

    Ok(())
}
