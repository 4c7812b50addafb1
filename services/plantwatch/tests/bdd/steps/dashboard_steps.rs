//! BDD step definitions for dashboard feature

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use tower::ServiceExt;

use plantwatch::config::{ViewerConfig, WeatherApiConfig};
use plantwatch::dashboard::{build_router, DashboardState};
use plantwatch::iot::IotStore;
use plantwatch::proxy::WeatherProxy;
use plantwatch::state::{new_state_handle, StateSettings};
use plantwatch::viewer::ViewerScene;
use plantwatch::weather_client::WeatherClient;

use crate::world::{CannedHttpClient, PlantwatchWorld};

#[given("a dashboard with a configured API key")]
fn dashboard_with_key(world: &mut PlantwatchWorld) {
    world.api_key = Some("secret".to_string());
}

#[given("a dashboard without an API key")]
fn dashboard_without_key(world: &mut PlantwatchWorld) {
    world.api_key = None;
}

#[given("the sensor history contains")]
fn sensor_history(world: &mut PlantwatchWorld, step: &Step) {
    let dir = tempfile::tempdir().unwrap();
    let content = step.docstring.clone().unwrap_or_default();
    std::fs::write(dir.path().join("iot_data.json"), content).unwrap();
    world.data_dir = Some(dir);
}

#[when(expr = "{string} is requested")]
async fn request(world: &mut PlantwatchWorld, uri: String) {
    let api = WeatherApiConfig {
        api_key: world.api_key.clone(),
        ..WeatherApiConfig::default()
    };
    let data_file = world
        .data_dir
        .as_ref()
        .map(|dir| dir.path().join("iot_data.json"))
        .unwrap_or_else(|| PathBuf::from("/nonexistent/iot_data.json"));

    let dashboard = DashboardState {
        state: new_state_handle(StateSettings::default()),
        proxy: Arc::new(WeatherProxy::new(
            &api,
            Arc::new(CannedHttpClient::new(200, "{}")),
        )),
        iot: Arc::new(IotStore::new(data_file)),
        weather: Arc::new(WeatherClient::new(
            "http://localhost:5000",
            Arc::new(CannedHttpClient::new(200, "{}")),
        )),
        scene: Arc::new(ViewerScene::from_config(&ViewerConfig::default())),
        static_dir: PathBuf::from("static"),
    };

    let response = build_router(dashboard)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    world.response_status = Some(response.status().as_u16());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    world.response_body = Some(serde_json::from_slice(&body).unwrap());
}

#[then(expr = "the response status should be {int}")]
fn response_status(world: &mut PlantwatchWorld, expected: u16) {
    assert_eq!(world.response_status.expect("no response"), expected);
}

#[then(expr = "the response field {string} should be {string}")]
fn response_field(world: &mut PlantwatchWorld, field: String, expected: String) {
    let body = world.response_body.as_ref().expect("no response body");
    assert_eq!(
        body[field.as_str()].as_str(),
        Some(expected.as_str()),
        "Response body:\n{}",
        body
    );
}

#[then(expr = "the response field {string} should be the number {int}")]
fn response_number(world: &mut PlantwatchWorld, field: String, expected: u64) {
    let body = world.response_body.as_ref().expect("no response body");
    assert_eq!(body[field.as_str()].as_u64(), Some(expected));
}
