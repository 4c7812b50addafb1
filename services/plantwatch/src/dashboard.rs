//! Web dashboard: HTML page, JSON API, weather and IoT endpoints

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::services::ServeDir;

use crate::event_log::EventLevel;
use crate::iot::IotStore;
use crate::poller;
use crate::proxy::WeatherProxy;
use crate::reconcile::Connectivity;
use crate::state::{SharedState, StateHandle};
use crate::timestamp::{self, TimestampFormat};
use crate::viewer::ViewerScene;
use crate::weather::WeatherView;
use crate::weather_client::WeatherClient;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub state: StateHandle,
    pub proxy: Arc<WeatherProxy>,
    pub iot: Arc<IotStore>,
    pub weather: Arc<WeatherClient>,
    pub scene: Arc<ViewerScene>,
    pub static_dir: PathBuf,
}

/// Build the dashboard axum router
pub fn build_router(dashboard: DashboardState) -> Router {
    let static_files = ServeDir::new(&dashboard.static_dir);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/status", get(status_handler))
        .route("/api/events", get(events_handler))
        .route("/api/weather", get(weather_handler))
        .route("/api/search", post(search_handler))
        .route("/iot/weather", get(iot_handler))
        .route("/api/viewer", get(viewer_handler))
        .route("/api/viewer/press", post(viewer_press_handler))
        .route("/api/viewer/drag", post(viewer_drag_handler))
        .route("/api/viewer/release", post(viewer_release_handler))
        .route("/api/viewer/reset", post(viewer_reset_handler))
        .route("/health", get(health_handler))
        .nest_service("/static", static_files)
        .with_state(dashboard)
}

#[derive(Debug, Deserialize)]
struct WeatherParams {
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Deserialize)]
struct PointerPosition {
    x: f64,
    y: f64,
}

fn json_response(status: u16, body: Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

async fn weather_handler(
    State(dashboard): State<DashboardState>,
    Query(params): Query<WeatherParams>,
) -> Response {
    let response = dashboard.proxy.forecast(params.q.as_deref()).await;
    json_response(response.status, response.body)
}

async fn iot_handler(State(dashboard): State<DashboardState>) -> Response {
    let response = dashboard.iot.summary().await;
    json_response(response.status, response.body)
}

async fn search_handler(
    State(dashboard): State<DashboardState>,
    Json(request): Json<SearchRequest>,
) -> Response {
    tracing::debug!("Search for '{}'", request.query);
    match poller::search(&dashboard.weather, &dashboard.state, &request.query).await {
        Ok(view) => Json(view.card()).into_response(),
        Err(crate::PlantwatchError::Weather(message)) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
        }
        Err(e) => (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() }))).into_response(),
    }
}

fn status_json(state: &SharedState) -> Value {
    let iso = |ts: Option<chrono::NaiveDateTime>| {
        ts.map(|ts| timestamp::format(&ts, TimestampFormat::Iso8601))
    };

    json!({
        "query": state.query,
        "weather": state.weather.as_ref().map(WeatherView::card),
        "reading": state.reading,
        "last_sync_epoch_ms": state.last_sync_epoch_ms,
        "connectivity": state.connectivity,
        "api_timestamp": iso(state.timestamps.api),
        "device_timestamp": iso(state.timestamps.device),
        "chart": state.chart,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    })
}

async fn status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    Json(status_json(&state))
}

async fn events_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    let events: Vec<_> = state.events.entries().cloned().collect();
    Json(events)
}

fn viewer_json(state: &SharedState, scene: &ViewerScene) -> Value {
    json!({
        "scene": scene,
        "rotation": state.viewer.as_xyzw(),
        "dragging": state.viewer.is_dragging(),
    })
}

async fn viewer_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let mut state = dashboard.state.write().await;
    state.sync_viewer(Instant::now());
    Json(viewer_json(&state, &dashboard.scene))
}

async fn viewer_press_handler(
    State(dashboard): State<DashboardState>,
    Json(position): Json<PointerPosition>,
) -> impl IntoResponse {
    let mut state = dashboard.state.write().await;
    state.sync_viewer(Instant::now());
    state.viewer.press(position.x, position.y);
    Json(viewer_json(&state, &dashboard.scene))
}

async fn viewer_drag_handler(
    State(dashboard): State<DashboardState>,
    Json(position): Json<PointerPosition>,
) -> impl IntoResponse {
    let mut state = dashboard.state.write().await;
    state.sync_viewer(Instant::now());
    state.viewer.drag(position.x, position.y);
    Json(viewer_json(&state, &dashboard.scene))
}

async fn viewer_release_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let mut state = dashboard.state.write().await;
    state.sync_viewer(Instant::now());
    state.viewer.release();
    Json(viewer_json(&state, &dashboard.scene))
}

async fn viewer_reset_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let mut state = dashboard.state.write().await;
    state.sync_viewer(Instant::now());
    state.viewer.reset();
    Json(viewer_json(&state, &dashboard.scene))
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_weather(view: Option<&WeatherView>) -> String {
    let Some(view) = view else {
        return r#"<p id="location-name" style="color: #6c757d;">Loading weather...</p>"#
            .to_string();
    };

    let hourly: String = view
        .hourly
        .iter()
        .map(|h| {
            format!(
                r#"<div style="display: inline-block; text-align: center; padding: 0.5rem;">
                    <p style="font-weight: 600; margin: 0;">{}:00</p>
                    <img src="{}" alt="{}" width="40" height="40">
                    <p style="font-weight: 600; margin: 0;">{}°C</p>
                    <small style="color: #6c757d;">{}%</small>
                </div>"#,
                h.hour,
                escape_html(&h.icon_url),
                escape_html(&h.description),
                h.temperature_c,
                h.chance_of_rain_pct
            )
        })
        .collect();

    let icon = view
        .icon_url
        .as_deref()
        .map(|url| {
            format!(
                r#"<img src="{}" alt="{}" style="width: 64px; height: 64px;">"#,
                escape_html(url),
                escape_html(&view.description)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<h3 id="location-name">{location}</h3>
        <p id="current-timestamp" style="color: #6c757d;">{updated}</p>
        <div style="display: flex; align-items: center; gap: 1rem;">
            <div id="weather-icon-container">{icon}</div>
            <div>
                <p id="main-temp" style="font-size: 2.5rem; font-weight: 700; margin: 0;">{temperature}</p>
                <p id="weather-description" style="margin: 0;">{description}</p>
            </div>
        </div>
        <p id="high-low-temp">{high_low}</p>
        <p id="feels-like">{feels_like}</p>
        <p id="rain-chance-container">{rain}</p>
        <p>Sunrise: <span id="sunrise-time">{sunrise}</span> / Sunset: <span id="sunset-time">{sunset}</span></p>
        <div id="hourly-forecast-container" style="overflow-x: auto; white-space: nowrap;">{hourly}</div>
        <div id="alerts-container" style="padding: 0.5rem; background-color: #d1ecf1; border-radius: 0.25rem;">{alert}</div>"#,
        location = escape_html(&view.location),
        updated = escape_html(&view.last_updated_label),
        icon = icon,
        temperature = view.temperature_label(),
        description = escape_html(&view.description),
        high_low = view.high_low_label(),
        feels_like = view.feels_like_label(),
        rain = view.rain_label(),
        sunrise = escape_html(&view.sunrise),
        sunset = escape_html(&view.sunset),
        hourly = hourly,
        alert = escape_html(&view.alert),
    )
}

/// Local wall-clock time of a log entry
fn log_time(epoch_ms: u64) -> String {
    i64::try_from(epoch_ms)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

fn connectivity_style(connectivity: Connectivity) -> (&'static str, &'static str) {
    match connectivity {
        Connectivity::Online => ("Online", "#155724"),
        Connectivity::Offline => ("Offline", "#721c24"),
        Connectivity::Unknown => ("Unknown", "#383d41"),
    }
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;

    let weather_card = render_weather(state.weather.as_ref());
    let (status_text, status_color) = connectivity_style(state.connectivity);

    let (temperature, humidity, soil) = match &state.reading {
        Some(r) => (r.temperature_label(), r.humidity_label(), r.soil.to_string()),
        None => ("--".to_string(), "--".to_string(), "--".to_string()),
    };

    let event_rows: String = state
        .events
        .entries()
        .map(|e| {
            let color = match e.level {
                EventLevel::Info => "#212529",
                EventLevel::Warning => "#721c24",
            };
            format!(
                r#"<li style="color: {};">{} {}</li>"#,
                color,
                log_time(e.timestamp_epoch_ms),
                escape_html(&e.message)
            )
        })
        .collect();

    let scene = serde_json::to_string(dashboard.scene.as_ref()).unwrap_or_else(|_| "{}".into());

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Plantwatch Dashboard</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/three@0.147.0/build/three.min.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/three@0.147.0/examples/js/libs/fflate.min.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/three@0.147.0/examples/js/loaders/FBXLoader.js"></script>
    <script>window.viewerScene = {scene};</script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 1200px; margin: 0 auto; padding: 1rem; background-color: #f8f9fa;">
    <h1>Plantwatch Dashboard</h1>
    <form id="search-form" style="margin-bottom: 1rem;">
        <input id="city-input" type="text" placeholder="City or lat,lon" style="padding: 0.4rem;">
        <button type="submit" style="padding: 0.4rem 1rem;">Search</button>
    </form>
    <div style="display: grid; grid-template-columns: 1fr 1fr; gap: 1rem;">
        <section id="weather-card" style="background: #fff; padding: 1rem; border-radius: 0.5rem;">{weather_card}</section>
        <section style="background: #fff; padding: 1rem; border-radius: 0.5rem;">
            <h2>Sensor</h2>
            <p>Status: <span id="device-status-text" style="font-weight: 600; color: {status_color};">{status_text}</span></p>
            <p>Temperature: <span id="temperature-value">{temperature}</span></p>
            <p>Humidity: <span id="humidity-value">{humidity}</span></p>
            <p>Soil: <span id="soil-value">{soil}</span></p>
            <p>Last sync: <span id="last-sync-time">Never</span></p>
            <div style="height: 240px;"><canvas id="sensor-chart"></canvas></div>
        </section>
        <section style="background: #fff; padding: 1rem; border-radius: 0.5rem;">
            <h2>Sensor Model</h2>
            <div id="viewer-container" style="width: 100%; height: 320px;"></div>
        </section>
        <section style="background: #fff; padding: 1rem; border-radius: 0.5rem;">
            <h2>Event Log</h2>
            <ul id="event-log" style="list-style: none; padding: 0;">{event_rows}</ul>
        </section>
    </div>
    <script>{page_script}</script>
</body>
</html>"#,
        scene = scene,
        weather_card = weather_card,
        status_color = status_color,
        status_text = status_text,
        temperature = temperature,
        humidity = humidity,
        soil = escape_html(&soil),
        event_rows = event_rows,
        page_script = PAGE_SCRIPT,
    );

    Html(html)
}

const PAGE_SCRIPT: &str = r#"
const statusColors = { online: ['Online', '#155724'], offline: ['Offline', '#721c24'] };
let chart;
let model;

function el(tag, props, ...children) {
    const node = Object.assign(document.createElement(tag), props);
    node.append(...children);
    return node;
}

function renderWeather(w) {
    if (!w) return;
    const hourly = w.hourly.map(h => el('div', { style: 'display: inline-block; text-align: center; padding: 0.5rem;' },
        el('p', { style: 'font-weight: 600; margin: 0;', textContent: `${h.hour}:00` }),
        el('img', { src: h.icon_url, alt: h.description, width: 40, height: 40 }),
        el('p', { style: 'font-weight: 600; margin: 0;', textContent: `${h.temperature_c}°C` }),
        el('small', { style: 'color: #6c757d;', textContent: `${h.chance_of_rain_pct}%` })));
    const icon = w.icon_url
        ? [el('img', { src: w.icon_url, alt: w.description, style: 'width: 64px; height: 64px;' })] : [];
    document.getElementById('weather-card').replaceChildren(
        el('h3', { id: 'location-name', textContent: w.location }),
        el('p', { id: 'current-timestamp', style: 'color: #6c757d;', textContent: w.last_updated_label }),
        el('div', { style: 'display: flex; align-items: center; gap: 1rem;' },
            el('div', { id: 'weather-icon-container' }, ...icon),
            el('div', {},
                el('p', { id: 'main-temp', style: 'font-size: 2.5rem; font-weight: 700; margin: 0;', textContent: w.temperature_label }),
                el('p', { id: 'weather-description', style: 'margin: 0;', textContent: w.description }))),
        el('p', { id: 'high-low-temp', textContent: w.high_low_label }),
        el('p', { id: 'feels-like', textContent: w.feels_like_label }),
        el('p', { id: 'rain-chance-container', textContent: w.rain_label }),
        el('p', {}, 'Sunrise: ', el('span', { id: 'sunrise-time', textContent: w.sunrise }),
            ' / Sunset: ', el('span', { id: 'sunset-time', textContent: w.sunset })),
        el('div', { id: 'hourly-forecast-container', style: 'overflow-x: auto; white-space: nowrap;' }, ...hourly),
        el('div', { id: 'alerts-container', style: 'padding: 0.5rem; background-color: #d1ecf1; border-radius: 0.25rem;', textContent: w.alert }));
}

function renderChart(data) {
    if (!window.Chart) return;
    if (!chart) {
        chart = new Chart(document.getElementById('sensor-chart').getContext('2d'), {
            type: 'line',
            data: {
                labels: data.labels,
                datasets: [
                    { label: 'Temperature (°C)', data: data.temperature, borderColor: 'rgba(239, 68, 68, 0.8)', yAxisID: 'y', tension: 0.4 },
                    { label: 'Humidity (%)', data: data.humidity, borderColor: 'rgba(59, 130, 246, 0.8)', yAxisID: 'y1', tension: 0.4 }
                ]
            },
            options: {
                responsive: true,
                maintainAspectRatio: false,
                scales: { y: { position: 'left' }, y1: { position: 'right', grid: { drawOnChartArea: false } } }
            }
        });
        return;
    }
    chart.data.labels = data.labels;
    chart.data.datasets[0].data = data.temperature;
    chart.data.datasets[1].data = data.humidity;
    chart.update('none');
}

function refreshData() {
    fetch('/api/status')
        .then(r => r.json())
        .then(data => {
            renderWeather(data.weather);
            if (data.reading) {
                document.getElementById('temperature-value').textContent = `${data.reading.temperature.toFixed(1)}°C`;
                document.getElementById('humidity-value').textContent = `${Math.round(data.reading.humidity)}%`;
                document.getElementById('soil-value').textContent = data.reading.soil;
            }
            document.getElementById('last-sync-time').textContent = data.last_sync_epoch_ms
                ? new Date(data.last_sync_epoch_ms).toLocaleString() : 'Never';
            const [text, color] = statusColors[data.connectivity] || ['Unknown', '#383d41'];
            const status = document.getElementById('device-status-text');
            status.textContent = text;
            status.style.color = color;
            renderChart(data.chart);
        });
    fetch('/api/events')
        .then(r => r.json())
        .then(events => {
            document.getElementById('event-log').replaceChildren(...events.map(e => el('li', {
                style: `color: ${e.level === 'warning' ? '#721c24' : '#212529'};`,
                textContent: `${new Date(e.timestamp_epoch_ms).toLocaleTimeString()} ${e.message}`
            })));
        });
}

document.getElementById('search-form').addEventListener('submit', (e) => {
    e.preventDefault();
    const input = document.getElementById('city-input');
    fetch('/api/search', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ query: input.value })
    })
        .then(r => r.json().then(body => {
            if (!r.ok) throw new Error(body.error);
            return body;
        }))
        .then(view => { renderWeather(view); input.value = ''; })
        .catch(err => alert(`Error: ${err.message}`));
});

function viewerPost(action, position) {
    return fetch(`/api/viewer/${action}`, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: position ? JSON.stringify(position) : undefined
    });
}

function initViewer() {
    if (!window.THREE) return;
    const scene = window.viewerScene;
    const container = document.getElementById('viewer-container');
    const renderer = new THREE.WebGLRenderer({ antialias: true });
    renderer.setSize(container.clientWidth, container.clientHeight);
    container.appendChild(renderer.domElement);

    const world = new THREE.Scene();
    world.background = new THREE.Color(scene.background);
    const camera = new THREE.PerspectiveCamera(scene.camera.fov,
        container.clientWidth / container.clientHeight, scene.camera.near, scene.camera.far);
    camera.position.set(...scene.camera.position);
    world.add(new THREE.AmbientLight(0xffffff, 0.8));
    const light = new THREE.DirectionalLight(0xffffff, 0.8);
    light.position.set(0, 50, 50);
    world.add(light);

    const texture = new THREE.TextureLoader().load(scene.texture_path);
    new THREE.FBXLoader().load(scene.model_path, (object) => {
        object.traverse(child => {
            if (child.isMesh && child.name.includes(scene.mesh_name)) {
                child.material = new THREE.MeshStandardMaterial({ map: texture });
            }
        });
        object.scale.setScalar(scene.scale);
        world.add(object);
        model = object;
    });

    const canvas = renderer.domElement;
    canvas.addEventListener('mousedown', e => viewerPost('press', { x: e.offsetX, y: e.offsetY }));
    canvas.addEventListener('mousemove', e => { if (e.buttons) viewerPost('drag', { x: e.offsetX, y: e.offsetY }); });
    canvas.addEventListener('mouseup', () => viewerPost('release'));
    canvas.addEventListener('mouseleave', () => viewerPost('release'));
    canvas.addEventListener('dblclick', () => viewerPost('reset'));

    setInterval(() => {
        fetch('/api/viewer').then(r => r.json()).then(v => {
            if (model) model.quaternion.set(...v.rotation);
        });
    }, 100);

    (function animate() {
        requestAnimationFrame(animate);
        renderer.render(world, camera);
    })();
}

initViewer();
refreshData();
setInterval(refreshData, 5000);
"#;
