//! Scripted provider and storage doubles shared by the unit tests.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use parking_lot::Mutex;
use std::{collections::HashMap, time::Duration};
use tokio::sync::watch;

use crate::{
    ProviderError, StorageError,
    model::{ForecastEntry, Query, QueryState, Reading, Suggestion, UnitSystem, WeatherSnapshot},
    provider::WeatherProvider,
    storage::Storage,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Geocode(String),
    Current(String, UnitSystem),
    Forecast(String, UnitSystem),
}

#[derive(Debug, Clone)]
pub enum Failure {
    Api(u16, String),
    Network(String),
}

impl Failure {
    fn into_error(self) -> ProviderError {
        match self {
            Failure::Api(status, message) => ProviderError::Api { status, message },
            Failure::Network(msg) => ProviderError::Unavailable(msg),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    geocode_delay: HashMap<String, Duration>,
    geocode_fail: HashMap<String, Failure>,
    current_delay: HashMap<String, Duration>,
    current_fail: HashMap<String, Failure>,
    forecast_delay: HashMap<String, Duration>,
    forecast_fail: Option<Failure>,
}

/// Provider whose answers are derived from the request, with per-key delays
/// and failures. Every call is recorded when it is issued.
#[derive(Debug, Default)]
pub struct FakeProvider {
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay_geocode(&self, text: &str, delay: Duration) {
        self.script.lock().geocode_delay.insert(text.to_string(), delay);
    }

    pub fn fail_geocode(&self, text: &str, failure: Failure) {
        self.script.lock().geocode_fail.insert(text.to_string(), failure);
    }

    pub fn delay_current(&self, query: &str, delay: Duration) {
        self.script.lock().current_delay.insert(query.to_string(), delay);
    }

    pub fn fail_current(&self, query: &str, failure: Failure) {
        self.script.lock().current_fail.insert(query.to_string(), failure);
    }

    pub fn delay_forecast(&self, query: &str, delay: Duration) {
        self.script.lock().forecast_delay.insert(query.to_string(), delay);
    }

    pub fn fail_forecast(&self, failure: Failure) {
        self.script.lock().forecast_fail = Some(failure);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn geocode_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Geocode(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn geocode(&self, text: &str, limit: usize) -> Result<Vec<Suggestion>, ProviderError> {
        self.calls.lock().push(Call::Geocode(text.to_string()));
        let (delay, failure) = {
            let script = self.script.lock();
            (
                script.geocode_delay.get(text).copied(),
                script.geocode_fail.get(text).cloned(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(failure) = failure {
            return Err(failure.into_error());
        }

        Ok((0..limit.min(2))
            .map(|i| Suggestion {
                name: text.to_string(),
                state: (i == 1).then(|| "State".to_string()),
                country: "XX".to_string(),
                latitude: i as f64,
                longitude: i as f64,
            })
            .collect())
    }

    async fn current(
        &self,
        query: &Query,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, ProviderError> {
        self.calls
            .lock()
            .push(Call::Current(query.to_string(), units));
        let (delay, failure) = {
            let script = self.script.lock();
            (
                script.current_delay.get(query.as_str()).copied(),
                script.current_fail.get(query.as_str()).cloned(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(failure) = failure {
            return Err(failure.into_error());
        }
        Ok(snapshot(query, units))
    }

    async fn forecast(
        &self,
        query: &Query,
        units: UnitSystem,
    ) -> Result<Vec<ForecastEntry>, ProviderError> {
        self.calls
            .lock()
            .push(Call::Forecast(query.to_string(), units));
        let (delay, failure) = {
            let script = self.script.lock();
            (
                script.forecast_delay.get(query.as_str()).copied(),
                script.forecast_fail.clone(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(failure) = failure {
            return Err(failure.into_error());
        }
        Ok(raw_forecast(6))
    }
}

pub fn reading(temperature: f64) -> Reading {
    Reading {
        condition: None,
        temperature,
        feels_like: temperature,
        humidity_pct: 60,
        pressure_hpa: 1015,
        wind_speed: 2.5,
        wind_deg: Some(180),
        visibility_m: Some(10_000),
        cloudiness_pct: 20,
    }
}

pub fn snapshot(query: &Query, units: UnitSystem) -> WeatherSnapshot {
    let temperature = match units {
        UnitSystem::Metric => 20.0,
        UnitSystem::Imperial => 68.0,
    };
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap();
    WeatherSnapshot {
        query: query.clone(),
        units,
        location_name: query.as_str().split(',').next().unwrap_or_default().to_string(),
        country: "XX".to_string(),
        latitude: 0.0,
        longitude: 0.0,
        reading: reading(temperature),
        observed_at: t0,
        sunrise: t0,
        sunset: t0 + ChronoDuration::hours(12),
        timezone_offset: 0,
    }
}

/// `days` days of 3-hourly-ish slots at 00, 06, 12 and 18 UTC.
pub fn raw_forecast(days: i64) -> Vec<ForecastEntry> {
    let start = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
    (0..days)
        .flat_map(|day| {
            [0, 6, 12, 18].map(move |hour| {
                let at = start + ChronoDuration::days(day) + ChronoDuration::hours(hour);
                ForecastEntry {
                    at,
                    slot: at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    reading: reading(hour as f64),
                }
            })
        })
        .collect()
}

/// Storage that fails every operation.
#[derive(Debug)]
pub struct BrokenStorage;

impl Storage for BrokenStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::NoDataDir)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::other("quota exceeded")))
    }
}

/// Wait until neither weather step is outstanding.
pub async fn settled(rx: &mut watch::Receiver<QueryState>) -> QueryState {
    rx.wait_for(|s| s.request.is_settled())
        .await
        .expect("state sender dropped")
        .clone()
}
