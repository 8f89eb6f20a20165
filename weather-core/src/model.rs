use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical place string used as the key for weather and forecast lookups.
///
/// Built either from the trimmed typed text or from a picked [`Suggestion`]'s
/// label. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query(String);

impl Query {
    /// Trim `raw` and wrap it; blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Suggestion> for Query {
    fn from(suggestion: &Suggestion) -> Self {
        Self(suggestion.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            UnitSystem::Metric => UnitSystem::Imperial,
            UnitSystem::Imperial => UnitSystem::Metric,
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
        }
    }

    pub fn speed_symbol(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial."
            )),
        }
    }
}

/// Place candidate produced by geocoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub state: Option<String>,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Suggestion {
    /// `"<name>[, <state>], <country>"`
    pub fn label(&self) -> String {
        match self.state.as_deref().filter(|s| !s.is_empty()) {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

/// Coarse condition group as reported by the API's `weather[0].main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConditionGroup {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    /// Mist, fog, haze, dust and friends.
    Atmosphere,
    #[default]
    Unknown,
}

impl ConditionGroup {
    pub fn from_main(main: &str) -> Self {
        match main {
            "Clear" => Self::Clear,
            "Clouds" => Self::Clouds,
            "Rain" => Self::Rain,
            "Drizzle" => Self::Drizzle,
            "Thunderstorm" => Self::Thunderstorm,
            "Snow" => Self::Snow,
            "Mist" | "Smoke" | "Haze" | "Dust" | "Fog" | "Sand" | "Ash" | "Squall"
            | "Tornado" => Self::Atmosphere,
            _ => Self::Unknown,
        }
    }

    pub fn has_precipitation(&self) -> bool {
        matches!(
            self,
            Self::Rain | Self::Drizzle | Self::Thunderstorm | Self::Snow
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Numeric OpenWeather condition id, e.g. 800 for clear sky.
    pub code: u32,
    pub group: ConditionGroup,
    pub description: String,
    pub icon: String,
}

/// Measurements shared by current conditions and forecast slots.
///
/// Temperatures and speeds are in whatever [`UnitSystem`] the request used;
/// nothing is converted locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub condition: Option<Condition>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed: f64,
    pub wind_deg: Option<u16>,
    pub visibility_m: Option<u32>,
    pub cloudiness_pct: u8,
}

/// Current conditions for the query that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub query: Query,
    pub units: UnitSystem,
    pub location_name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub reading: Reading,
    pub observed_at: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    /// Shift from UTC in seconds.
    pub timezone_offset: i32,
}

impl WeatherSnapshot {
    pub fn group(&self) -> ConditionGroup {
        self.reading
            .condition
            .as_ref()
            .map(|c| c.group)
            .unwrap_or_default()
    }

    pub fn is_night_at(&self, now: DateTime<Utc>) -> bool {
        now < self.sunrise || now > self.sunset
    }

    /// `at` expressed in the location's own clock. Out-of-range offsets fall
    /// back to UTC.
    pub fn local_time(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.timezone_offset).unwrap_or_else(|| Utc.fix());
        at.with_timezone(&offset)
    }
}

/// One forecast slot, tagged with its timestamp and the API's slot label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub at: DateTime<Utc>,
    /// `"YYYY-MM-DD HH:MM:SS"` as the API labels the slot.
    pub slot: String,
    pub reading: Reading,
}

/// Progress of the weather lookup for the active query.
///
/// `loading` implies no snapshot and no error. The forecast is filled in
/// after the snapshot, independently, and may stay empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestState {
    pub generation: u64,
    pub loading: bool,
    pub forecast_loading: bool,
    pub error: Option<String>,
    pub snapshot: Option<WeatherSnapshot>,
    pub forecast: Vec<ForecastEntry>,
}

impl RequestState {
    pub fn is_settled(&self) -> bool {
        !self.loading && !self.forecast_loading
    }
}

/// What the render layer reads: the active query, the unit preference and the
/// lookup state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryState {
    pub query: Option<Query>,
    pub units: UnitSystem,
    pub request: RequestState,
}

/// Autocomplete list as shown under the input box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionState {
    pub generation: u64,
    pub input: String,
    pub items: Vec<Suggestion>,
    pub visible: bool,
    /// A request for `input` is on the wire.
    pub loading: bool,
    /// A lookup for `input` is scheduled or running.
    pub pending: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn suggestion(state: Option<&str>) -> Suggestion {
        Suggestion {
            name: "Springfield".into(),
            state: state.map(str::to_string),
            country: "US".into(),
            latitude: 39.8,
            longitude: -89.6,
        }
    }

    #[test]
    fn label_includes_state_when_present() {
        assert_eq!(suggestion(Some("Illinois")).label(), "Springfield, Illinois, US");
        assert_eq!(suggestion(None).label(), "Springfield, US");
        assert_eq!(suggestion(Some("")).label(), "Springfield, US");
    }

    #[test]
    fn query_is_trimmed_and_never_blank() {
        assert_eq!(Query::parse("  Paris, FR ").unwrap().as_str(), "Paris, FR");
        assert!(Query::parse("   ").is_none());
    }

    #[test]
    fn units_toggle_twice_is_identity() {
        let u = UnitSystem::Metric;
        assert_eq!(u.toggled(), UnitSystem::Imperial);
        assert_eq!(u.toggled().toggled(), u);
    }

    #[test]
    fn units_parse_case_insensitive() {
        assert_eq!(UnitSystem::try_from("Imperial").unwrap(), UnitSystem::Imperial);
        let err = UnitSystem::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }

    #[test]
    fn condition_groups() {
        assert_eq!(ConditionGroup::from_main("Haze"), ConditionGroup::Atmosphere);
        assert_eq!(ConditionGroup::from_main("???"), ConditionGroup::Unknown);
        assert!(ConditionGroup::Snow.has_precipitation());
        assert!(!ConditionGroup::Clouds.has_precipitation());
    }

    #[test]
    fn night_and_local_time() {
        let snapshot = WeatherSnapshot {
            query: Query::parse("Paris").unwrap(),
            units: UnitSystem::Metric,
            location_name: "Paris".into(),
            country: "FR".into(),
            latitude: 48.85,
            longitude: 2.35,
            reading: Reading {
                condition: None,
                temperature: 10.0,
                feels_like: 9.0,
                humidity_pct: 70,
                pressure_hpa: 1012,
                wind_speed: 3.0,
                wind_deg: None,
                visibility_m: None,
                cloudiness_pct: 0,
            },
            observed_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            sunrise: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            sunset: Utc.timestamp_opt(1_700_030_000, 0).unwrap(),
            timezone_offset: 3600,
        };

        assert!(!snapshot.is_night_at(Utc.timestamp_opt(1_700_010_000, 0).unwrap()));
        assert!(snapshot.is_night_at(Utc.timestamp_opt(1_700_040_000, 0).unwrap()));
        assert_eq!(snapshot.group(), ConditionGroup::Unknown);

        let local = snapshot.local_time(snapshot.sunrise);
        assert_eq!(local.offset().local_minus_utc(), 3600);
    }
}
