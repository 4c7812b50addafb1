//! Rolling chart window for temperature and humidity

use std::collections::VecDeque;

use rand::Rng;
use serde::Serialize;

/// Default number of chart slots
pub const DEFAULT_CHART_CAPACITY: usize = 12;

/// Label given to every sample appended after seeding
pub const LATEST_LABEL: &str = "Now";

/// Fixed-size buffer; pushing into a full buffer drops the oldest value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RollingBuffer<T> {
    #[serde(skip)]
    capacity: usize,
    values: VecDeque<T>,
}

impl<T> RollingBuffer<T> {
    /// Build a full buffer from `fill`, called once per slot index
    pub fn filled(capacity: usize, mut fill: impl FnMut(usize) -> T) -> Self {
        Self {
            capacity,
            values: (0..capacity).map(&mut fill).collect(),
        }
    }

    /// Append `value`, shifting the oldest out first when full
    pub fn push(&mut self, value: T) {
        if self.capacity == 0 {
            return;
        }
        if self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most recent value
    pub fn latest(&self) -> Option<&T> {
        self.values.back()
    }

    /// Values from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }
}

/// The two-series sensor chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorChart {
    pub labels: RollingBuffer<String>,
    pub temperature: RollingBuffer<f64>,
    pub humidity: RollingBuffer<f64>,
}

impl SensorChart {
    /// A chart pre-filled with simulated history so it never starts empty
    pub fn seeded<R: Rng>(capacity: usize, rng: &mut R) -> Self {
        Self {
            labels: RollingBuffer::filled(capacity, |i| format!("{}h ago", i * 2)),
            temperature: RollingBuffer::filled(capacity, |_| rng.random_range(20.0..25.0)),
            humidity: RollingBuffer::filled(capacity, |_| rng.random_range(60.0..70.0)),
        }
    }

    /// Append one sample to all series
    pub fn push(&mut self, temperature: f64, humidity: f64) {
        self.labels.push(LATEST_LABEL.to_string());
        self.temperature.push(round_to_tenth(temperature));
        self.humidity.push(humidity.round());
    }

    /// Re-seed the chart in place, keeping its capacity
    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        *self = Self::seeded(self.labels.capacity(), rng);
    }

    pub fn capacity(&self) -> usize {
        self.labels.capacity()
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
