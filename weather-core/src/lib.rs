//! Core library for the `weather` CLI.
//!
//! This crate turns keystrokes into consistent, race-free weather lookups:
//! - Debounced, cancellable place suggestions ([`suggest`])
//! - Current conditions with a best-effort daily forecast ([`weather`])
//! - Session state and persisted preferences ([`store`], [`storage`])
//! - Configuration and the OpenWeather backend ([`config`], [`provider`])
//!
//! Front ends drive an [`Orchestrator`] and render the [`QueryState`] and
//! [`SuggestionState`] it publishes.

pub mod config;
pub mod error;
pub mod forecast;
pub mod model;
pub mod provider;
pub mod storage;
pub mod store;
pub mod suggest;
pub mod weather;

#[cfg(test)]
mod test_support;

pub use config::{Config, Endpoints, Settings};
pub use error::{ProviderError, StorageError};
pub use model::{
    ConditionGroup, ForecastEntry, Query, QueryState, Reading, RequestState, Suggestion,
    SuggestionState, UnitSystem, WeatherSnapshot,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use storage::{FileStorage, MemoryStorage, Preferences, Storage};
pub use store::Orchestrator;
