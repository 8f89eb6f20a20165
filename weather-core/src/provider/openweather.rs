use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    ProviderError,
    config::Endpoints,
    model::{
        Condition, ConditionGroup, ForecastEntry, Query, Reading, Suggestion, UnitSystem,
        WeatherSnapshot,
    },
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    endpoints: Endpoints,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoints(api_key, Endpoints::default())
    }

    pub fn with_endpoints(api_key: String, endpoints: Endpoints) -> Self {
        Self {
            api_key,
            endpoints,
            http: Client::new(),
        }
    }

    async fn get(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<(StatusCode, String), ProviderError> {
        tracing::debug!(url, key = %mask_key(&self.api_key), ?params, "OpenWeather request");

        let res = self
            .http
            .get(url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        tracing::debug!(%status, body = %truncate_body(&body), "OpenWeather response");
        Ok((status, body))
    }
}

#[derive(Debug, Deserialize)]
struct OwGeoEntry {
    name: String,
    state: Option<String>,
    country: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    #[serde(default)]
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: u32,
    main: String,
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Default, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    #[serde(default)]
    coord: OwCoord,
    dt: i64,
    #[serde(default)]
    timezone: i32,
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    visibility: Option<u32>,
    #[serde(default)]
    clouds: OwClouds,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    #[serde(default)]
    dt_txt: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    visibility: Option<u32>,
    #[serde(default)]
    clouds: OwClouds,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

fn reading(
    main: &OwMain,
    weather: &[OwWeather],
    wind: &OwWind,
    visibility: Option<u32>,
    clouds: &OwClouds,
) -> Reading {
    let condition = weather.first().map(|w| Condition {
        code: w.id,
        group: ConditionGroup::from_main(&w.main),
        description: w.description.clone(),
        icon: w.icon.clone(),
    });

    Reading {
        condition,
        temperature: main.temp,
        feels_like: main.feels_like,
        humidity_pct: main.humidity,
        pressure_hpa: main.pressure,
        wind_speed: wind.speed,
        wind_deg: wind.deg,
        visibility_m: visibility,
        cloudiness_pct: clouds.all,
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn geocode(&self, text: &str, limit: usize) -> Result<Vec<Suggestion>, ProviderError> {
        let limit_param = limit.to_string();
        let (status, body) = self
            .get(
                &self.endpoints.geocode_url,
                &[("q", text), ("limit", limit_param.as_str())],
            )
            .await?;

        // Error objects and anything else that isn't a list of places count as
        // "no suggestions".
        let entries: Vec<OwGeoEntry> = match serde_json::from_str(&body) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(%status, error = %e, "Geocoding returned no usable list");
                return Ok(Vec::new());
            }
        };

        Ok(entries
            .into_iter()
            .take(limit)
            .map(|e| Suggestion {
                name: e.name,
                state: e.state,
                country: e.country,
                latitude: e.lat,
                longitude: e.lon,
            })
            .collect())
    }

    async fn current(
        &self,
        query: &Query,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, ProviderError> {
        let (status, body) = self
            .get(
                &self.endpoints.weather_url,
                &[("q", query.as_str()), ("units", units.as_str())],
            )
            .await?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: upstream_message(status, &body),
            });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;

        Ok(WeatherSnapshot {
            query: query.clone(),
            units,
            location_name: parsed.name,
            country: parsed.sys.country.unwrap_or_default(),
            latitude: parsed.coord.lat,
            longitude: parsed.coord.lon,
            reading: reading(
                &parsed.main,
                &parsed.weather,
                &parsed.wind,
                parsed.visibility,
                &parsed.clouds,
            ),
            observed_at: unix_to_utc(parsed.dt).unwrap_or_else(Utc::now),
            sunrise: unix_to_utc(parsed.sys.sunrise).unwrap_or_default(),
            sunset: unix_to_utc(parsed.sys.sunset).unwrap_or_default(),
            timezone_offset: parsed.timezone,
        })
    }

    async fn forecast(
        &self,
        query: &Query,
        units: UnitSystem,
    ) -> Result<Vec<ForecastEntry>, ProviderError> {
        let (status, body) = self
            .get(
                &self.endpoints.forecast_url,
                &[("q", query.as_str()), ("units", units.as_str())],
            )
            .await?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: upstream_message(status, &body),
            });
        }

        let parsed: OwForecastResponse = serde_json::from_str(&body)?;

        Ok(parsed
            .list
            .into_iter()
            .filter_map(|e| {
                let at = unix_to_utc(e.dt)?;
                Some(ForecastEntry {
                    at,
                    slot: e.dt_txt,
                    reading: reading(&e.main, &e.weather, &e.wind, e.visibility, &e.clouds),
                })
            })
            .collect())
    }
}

/// `message`, then `error`, then the reason phrase, then a generic fallback.
fn upstream_message(status: StatusCode, body: &str) -> String {
    let json: serde_json::Value = serde_json::from_str(body).unwrap_or_default();

    ["message", "error"]
        .into_iter()
        .filter_map(|field| json.get(field).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "Request failed".to_string())
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

fn mask_key(key: &str) -> String {
    if key.chars().count() <= 8 {
        return format!("*** (len:{})", key.len());
    }
    let head: String = key.chars().take(4).collect();
    let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("{head}...{tail} (len:{})", key.len())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
