//! BDD test world for plantwatch service

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cucumber::World;
use plantwatch::io::{HttpClient, HttpResponse};
use plantwatch::reconcile::{Connectivity, ReconcileTimestamps};
use plantwatch::state::StateHandle;

/// HTTP client answering every request with the same canned response
#[derive(Debug)]
pub struct CannedHttpClient {
    pub status: u16,
    pub body: String,
    pub calls: Arc<AtomicUsize>,
}

impl CannedHttpClient {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl HttpClient for CannedHttpClient {
    async fn get(&self, _url: &str, _query: &[(&str, &str)]) -> plantwatch::Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

#[derive(Debug, Default, World)]
pub struct PlantwatchWorld {
    // Reconciliation
    pub timestamps: ReconcileTimestamps,
    pub connectivity: Option<Connectivity>,

    // Polling
    pub state: Option<StateHandle>,
    pub weather_body: Option<String>,
    pub feed_body: Option<String>,
    pub weather_calls: Option<Arc<AtomicUsize>>,
    pub chart_before: Option<plantwatch::chart::SensorChart>,

    // Dashboard
    pub api_key: Option<String>,
    pub data_dir: Option<tempfile::TempDir>,
    pub response_status: Option<u16>,
    pub response_body: Option<serde_json::Value>,
}
