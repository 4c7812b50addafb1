//! Device connectivity reconciliation
//!
//! The sensor board has no heartbeat of its own. It is considered online
//! while its last report lies close enough to the weather API's last update.

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Default gap after which the device is reported offline
pub const DEFAULT_OFFLINE_THRESHOLD: TimeDelta = TimeDelta::minutes(15);

/// Inferred connectivity of the sensor board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Online,
    Offline,
    Unknown,
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connectivity::Online => write!(f, "Online"),
            Connectivity::Offline => write!(f, "Offline"),
            Connectivity::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Last timestamps reported by each side, overwritten on every successful fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileTimestamps {
    pub api: Option<NaiveDateTime>,
    pub device: Option<NaiveDateTime>,
}

impl ReconcileTimestamps {
    /// Connectivity implied by the stored pair; `Unknown` until both are known
    pub fn connectivity(&self, threshold: TimeDelta) -> Connectivity {
        match (self.api, self.device) {
            (Some(api), Some(device)) => reconcile(api, device, threshold),
            _ => Connectivity::Unknown,
        }
    }
}

/// Compare the two timestamps; a gap strictly larger than `threshold` means offline
pub fn reconcile(api: NaiveDateTime, device: NaiveDateTime, threshold: TimeDelta) -> Connectivity {
    if (api - device).abs() > threshold {
        Connectivity::Offline
    } else {
        Connectivity::Online
    }
}
