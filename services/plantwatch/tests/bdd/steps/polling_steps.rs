//! BDD step definitions for polling and search

use std::sync::atomic::Ordering;
use std::sync::Arc;

use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use plantwatch::config::PollerConfig;
use plantwatch::event_log::EventLevel;
use plantwatch::poller::{self, Poller};
use plantwatch::sensor::HttpSensorSource;
use plantwatch::state::{new_state_handle, StateHandle, StateSettings};
use plantwatch::weather_client::WeatherClient;

use crate::world::{CannedHttpClient, PlantwatchWorld};

const DASHBOARD_URL: &str = "http://localhost:5000";

const FORECAST: &str = r#"{
    "location": {"name": "Wroclaw", "country": "Poland"},
    "current": {
        "last_updated": "2025-05-13 14:30",
        "temp_c": 18.5,
        "feelslike_c": 17.2,
        "condition": {"text": "Partly cloudy", "icon": "//cdn.weatherapi.com/116.png"}
    },
    "forecast": {
        "forecastday": [{
            "day": {"maxtemp_c": 21.4, "mintemp_c": 9.6, "daily_chance_of_rain": 40},
            "astro": {"sunrise": "04:58 AM", "sunset": "08:39 PM"},
            "hour": []
        }]
    }
}"#;

fn state(world: &mut PlantwatchWorld) -> StateHandle {
    world
        .state
        .get_or_insert_with(|| new_state_handle(StateSettings::default()))
        .clone()
}

fn weather_client(world: &mut PlantwatchWorld) -> WeatherClient {
    let body = world
        .weather_body
        .clone()
        .unwrap_or_else(|| FORECAST.to_string());
    let http = CannedHttpClient::new(200, body);
    world.weather_calls = Some(Arc::clone(&http.calls));
    WeatherClient::new(DASHBOARD_URL, Arc::new(http))
}

#[given("a fresh dashboard context")]
fn fresh_context(world: &mut PlantwatchWorld) {
    world.state = Some(new_state_handle(StateSettings::default()));
}

#[given("the weather proxy answers with a forecast for Wroclaw")]
fn weather_forecast(world: &mut PlantwatchWorld) {
    world.weather_body = Some(FORECAST.to_string());
}

#[given("the weather proxy answers with")]
fn weather_answers(world: &mut PlantwatchWorld, step: &Step) {
    world.weather_body = step.docstring.clone();
}

#[given("the IoT feed answers with")]
fn feed_answers(world: &mut PlantwatchWorld, step: &Step) {
    world.feed_body = step.docstring.clone();
}

#[given(expr = "{int} events have been logged")]
async fn events_logged(world: &mut PlantwatchWorld, count: u64) {
    let handle = state(world);
    let mut s = handle.write().await;
    for i in 0..count {
        s.record_event(format!("event {}", i), i);
    }
}

#[when("the dashboard polls once")]
async fn poll_once(world: &mut PlantwatchWorld) {
    let handle = state(world);
    world.chart_before = Some(handle.read().await.chart.clone());

    let weather = Arc::new(weather_client(world));
    let feed = world.feed_body.clone().unwrap_or_default();
    let source = Arc::new(HttpSensorSource::new(
        DASHBOARD_URL,
        Arc::new(CannedHttpClient::new(200, feed)),
    ));

    let poller = Poller::new(
        weather,
        source,
        &PollerConfig::default(),
        handle,
        CancellationToken::new(),
    );
    poller.poll_once().await;
}

#[when(expr = "the user searches for {string}")]
async fn user_searches(world: &mut PlantwatchWorld, query: String) {
    let handle = state(world);
    let client = weather_client(world);
    let _ = poller::search(&client, &handle, &query).await;
}

#[then(expr = "the sensor temperature should read {string}")]
async fn temperature_reads(world: &mut PlantwatchWorld, expected: String) {
    let handle = state(world);
    let s = handle.read().await;
    let reading = s.reading.as_ref().expect("no reading stored");
    assert_eq!(reading.temperature_label(), expected);
}

#[then(expr = "the newest chart sample should be {float}")]
async fn newest_chart_sample(world: &mut PlantwatchWorld, expected: f64) {
    let handle = state(world);
    let s = handle.read().await;
    assert_eq!(s.chart.temperature.latest(), Some(&expected));
    assert_eq!(s.chart.labels.latest().map(String::as_str), Some("Now"));
}

#[then("no sensor reading should be stored")]
async fn no_reading(world: &mut PlantwatchWorld) {
    let handle = state(world);
    assert!(handle.read().await.reading.is_none());
}

#[then("the chart should be unchanged")]
async fn chart_unchanged(world: &mut PlantwatchWorld) {
    let handle = state(world);
    let before = world.chart_before.as_ref().expect("chart not captured");
    assert_eq!(&handle.read().await.chart, before);
}

#[then(expr = "the newest log entry should be a warning starting with {string}")]
async fn newest_warning(world: &mut PlantwatchWorld, prefix: String) {
    let handle = state(world);
    let s = handle.read().await;
    let entry = s.events.latest().expect("event log is empty");
    assert_eq!(entry.level, EventLevel::Warning);
    assert!(
        entry.message.starts_with(&prefix),
        "Expected '{}' to start with '{}'",
        entry.message,
        prefix
    );
}

#[then(expr = "the newest log entry should be {string}")]
async fn newest_entry(world: &mut PlantwatchWorld, expected: String) {
    let handle = state(world);
    let s = handle.read().await;
    assert_eq!(s.events.latest().expect("event log is empty").message, expected);
}

#[then(expr = "the event log should hold {int} entries")]
async fn log_holds(world: &mut PlantwatchWorld, expected: usize) {
    let handle = state(world);
    assert_eq!(handle.read().await.events.len(), expected);
}

#[then(expr = "the weather card should show {string}")]
async fn weather_card_shows(world: &mut PlantwatchWorld, location: String) {
    let handle = state(world);
    let s = handle.read().await;
    assert_eq!(s.weather.as_ref().expect("no weather").location, location);
}

#[then(expr = "the device should be reported {string}")]
async fn device_reported(world: &mut PlantwatchWorld, expected: String) {
    let handle = state(world);
    assert_eq!(handle.read().await.connectivity.to_string(), expected);
}

#[then("the weather proxy should not have been called")]
fn proxy_not_called(world: &mut PlantwatchWorld) {
    let calls = world.weather_calls.as_ref().expect("no weather client");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[then(expr = "polling should still target {string}")]
async fn polling_targets(world: &mut PlantwatchWorld, expected: String) {
    let handle = state(world);
    assert_eq!(handle.read().await.query, expected);
}
