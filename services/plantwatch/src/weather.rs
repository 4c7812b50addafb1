//! Weather payload types and their display projection

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::timestamp::{self, TimestampFormat};

/// Banner shown while the upstream alert feed is disabled
pub const NO_ALERTS_MESSAGE: &str = "No active alerts for this region.";

/// Forecast response of the upstream weather API (fields the dashboard reads)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherPayload {
    pub location: Location,
    pub current: Current,
    pub forecast: Forecast,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Current {
    pub last_updated: String,
    pub temp_c: f64,
    pub feelslike_c: f64,
    pub condition: Condition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDay {
    pub day: DaySummary,
    pub astro: Astro,
    pub hour: Vec<HourForecast>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySummary {
    pub maxtemp_c: f64,
    pub mintemp_c: f64,
    pub daily_chance_of_rain: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Astro {
    pub sunrise: String,
    pub sunset: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourForecast {
    pub time: String,
    pub temp_c: f64,
    pub chance_of_rain: f64,
    pub condition: Condition,
}

/// One entry of the hourly strip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyView {
    pub hour: u32,
    pub temperature_c: i64,
    pub chance_of_rain_pct: i64,
    pub description: String,
    pub icon_url: String,
}

/// Everything the weather card displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherView {
    pub location: String,
    #[serde(skip)]
    pub last_updated: Option<NaiveDateTime>,
    pub last_updated_label: String,
    pub temperature_c: i64,
    pub feels_like_c: i64,
    pub high_c: i64,
    pub low_c: i64,
    pub rain_chance_pct: i64,
    pub description: String,
    pub icon_url: Option<String>,
    pub sunrise: String,
    pub sunset: String,
    pub hourly: Vec<HourlyView>,
    pub alert: String,
    pub placeholder: bool,
}

impl WeatherView {
    /// Project a raw JSON response; incomplete payloads are rejected
    pub fn from_json(value: serde_json::Value, now: NaiveDateTime) -> crate::Result<Self> {
        let payload: WeatherPayload = serde_json::from_value(value).map_err(|e| {
            crate::PlantwatchError::Weather(format!("Incomplete weather payload: {}", e))
        })?;
        Self::from_payload(&payload, now)
    }

    /// Project a typed payload; hourly entries before the hour of `now` are dropped
    pub fn from_payload(payload: &WeatherPayload, now: NaiveDateTime) -> crate::Result<Self> {
        let today = payload.forecast.forecastday.first().ok_or_else(|| {
            crate::PlantwatchError::Weather("Weather payload has no forecast days".to_string())
        })?;

        let last_updated =
            timestamp::parse(&payload.current.last_updated, TimestampFormat::WeatherApi)?;

        let current_hour = now.hour();
        let hourly = today
            .hour
            .iter()
            .filter_map(|h| match timestamp::parse(&h.time, TimestampFormat::WeatherApi) {
                Ok(time) => Some((time.hour(), h)),
                Err(e) => {
                    tracing::debug!("Skipping hourly entry: {}", e);
                    None
                }
            })
            .filter(|(hour, _)| *hour >= current_hour)
            .map(|(hour, h)| HourlyView {
                hour,
                temperature_c: round_half_up(h.temp_c),
                chance_of_rain_pct: round_half_up(h.chance_of_rain),
                description: h.condition.text.clone(),
                icon_url: icon_url(&h.condition.icon),
            })
            .collect();

        Ok(Self {
            location: format!("{}, {}", payload.location.name, payload.location.country),
            last_updated: Some(last_updated),
            last_updated_label: format!(
                "Last updated: {}",
                last_updated.format("%d.%m.%Y, %H:%M")
            ),
            temperature_c: round_half_up(payload.current.temp_c),
            feels_like_c: round_half_up(payload.current.feelslike_c),
            high_c: round_half_up(today.day.maxtemp_c),
            low_c: round_half_up(today.day.mintemp_c),
            rain_chance_pct: round_half_up(today.day.daily_chance_of_rain),
            description: payload.current.condition.text.clone(),
            icon_url: Some(icon_url(&payload.current.condition.icon)),
            sunrise: today.astro.sunrise.clone(),
            sunset: today.astro.sunset.clone(),
            hourly,
            alert: NO_ALERTS_MESSAGE.to_string(),
            placeholder: false,
        })
    }

    /// Fixed card shown for an empty search; carries no API timestamp
    pub fn space_placeholder() -> Self {
        Self {
            location: "Low Earth Orbit, Space".to_string(),
            last_updated: None,
            last_updated_label: "Last updated: never".to_string(),
            temperature_c: -270,
            feels_like_c: -273,
            high_c: 121,
            low_c: -157,
            rain_chance_pct: 0,
            description: "Solar wind, no atmosphere".to_string(),
            icon_url: None,
            sunrise: "every 92 minutes".to_string(),
            sunset: "every 92 minutes".to_string(),
            hourly: Vec::new(),
            alert: "Space weather: geomagnetic activity quiet.".to_string(),
            placeholder: true,
        }
    }

    pub fn temperature_label(&self) -> String {
        format!("{}°C", self.temperature_c)
    }

    pub fn high_low_label(&self) -> String {
        format!("Max: {}°C / Min: {}°C", self.high_c, self.low_c)
    }

    pub fn feels_like_label(&self) -> String {
        format!("Feels like: {}°C", self.feels_like_c)
    }

    pub fn rain_label(&self) -> String {
        format!("Chance of rain: {}%", self.rain_chance_pct)
    }

    pub fn card(&self) -> WeatherCard<'_> {
        WeatherCard {
            view: self,
            temperature_label: self.temperature_label(),
            high_low_label: self.high_low_label(),
            feels_like_label: self.feels_like_label(),
            rain_label: self.rain_label(),
        }
    }
}

/// Weather view as sent to the page, with the card's display labels
#[derive(Debug, Serialize)]
pub struct WeatherCard<'a> {
    #[serde(flatten)]
    pub view: &'a WeatherView,
    pub temperature_label: String,
    pub high_low_label: String,
    pub feels_like_label: String,
    pub rain_label: String,
}

/// Icon paths come back protocol-relative (`//cdn...`)
fn icon_url(icon: &str) -> String {
    if icon.starts_with("//") {
        format!("https:{}", icon)
    } else {
        icon.to_string()
    }
}

/// Round half toward positive infinity, the way the browser rounds
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
