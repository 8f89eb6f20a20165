use crate::{
    Config, ProviderError,
    model::{ForecastEntry, Query, Suggestion, UnitSystem, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Backend the orchestrator talks to: geocoding, current conditions and the
/// multi-day forecast.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Place candidates for free text, most relevant first, at most `limit`.
    ///
    /// A malformed or non-list body is an empty result, not an error.
    async fn geocode(&self, text: &str, limit: usize) -> Result<Vec<Suggestion>, ProviderError>;

    async fn current(
        &self,
        query: &Query,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, ProviderError>;

    /// Raw forecast slots in the order the backend returned them.
    async fn forecast(
        &self,
        query: &Query,
        units: UnitSystem,
    ) -> Result<Vec<ForecastEntry>, ProviderError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `weather configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    let provider =
        OpenWeatherProvider::with_endpoints(api_key.to_owned(), config.endpoints.clone());
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        let provider = provider_from_config(&cfg);
        assert!(provider.is_ok());
    }
}
