//! Session state: the active query, the unit preference, and the persisted
//! last city, wired to the two fetchers.

use std::sync::Arc;
use tokio::sync::watch;

use crate::{
    config::Settings,
    model::{Query, QueryState, SuggestionState, UnitSystem},
    provider::WeatherProvider,
    storage::{Preferences, Storage},
    suggest::SuggestionFetcher,
    weather::WeatherFetcher,
};

/// Entry point for a front end: feed it keystrokes, picks, submits and unit
/// toggles, and read [`QueryState`] / [`SuggestionState`] back.
///
/// All methods return immediately; network work runs on spawned tasks, so an
/// `Orchestrator` must live inside a tokio runtime.
#[derive(Debug)]
pub struct Orchestrator {
    prefs: Preferences,
    state: Arc<watch::Sender<QueryState>>,
    weather: WeatherFetcher,
    suggestions: SuggestionFetcher,
}

impl Orchestrator {
    /// Seed from storage. A persisted last city becomes the active query and
    /// is fetched right away.
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        storage: Arc<dyn Storage>,
        settings: Settings,
    ) -> Self {
        let mut orchestrator = Self::without_last_city(provider, storage, settings);
        orchestrator.restore_last_city();
        orchestrator
    }

    /// Seed only the unit preference; the persisted last city is left alone.
    /// For front ends that already know which city to show.
    pub fn without_last_city(
        provider: Arc<dyn WeatherProvider>,
        storage: Arc<dyn Storage>,
        settings: Settings,
    ) -> Self {
        let prefs = Preferences::new(storage);
        let units = prefs.units().unwrap_or_default();

        let (tx, _rx) = watch::channel(QueryState {
            units,
            ..QueryState::default()
        });
        let state = Arc::new(tx);

        Self {
            weather: WeatherFetcher::new(Arc::clone(&provider), Arc::clone(&state)),
            suggestions: SuggestionFetcher::new(provider, settings),
            prefs,
            state,
        }
    }

    fn restore_last_city(&mut self) {
        let Some(city) = self.prefs.last_city() else {
            return;
        };
        let units = self.units();
        tracing::info!(%city, %units, "Restoring last searched city");
        self.suggestions.set_input_quietly(&city);
        if let Some(query) = Query::parse(&city) {
            self.weather.start(query, units);
        }
    }

    pub fn state(&self) -> QueryState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.state.subscribe()
    }

    pub fn suggestions(&self) -> SuggestionState {
        self.suggestions.current()
    }

    pub fn subscribe_suggestions(&self) -> watch::Receiver<SuggestionState> {
        self.suggestions.subscribe()
    }

    pub fn units(&self) -> UnitSystem {
        self.state.borrow().units
    }

    pub fn query(&self) -> Option<Query> {
        self.state.borrow().query.clone()
    }

    /// The text box changed.
    pub fn input(&mut self, text: &str) {
        self.suggestions.on_input(text);
    }

    /// Activate the suggestion at `index` under its canonical label.
    pub fn pick_suggestion(&mut self, index: usize) -> Option<Query> {
        let picked = self.suggestions.pick(index)?;
        let query = Query::from(&picked);
        self.weather.start(query.clone(), self.units());
        Some(query)
    }

    /// Activate whatever is typed. Blank text is ignored. The trimmed text is
    /// remembered as the last city.
    pub fn submit(&mut self) -> Option<Query> {
        let query = Query::parse(&self.suggestions.current().input)?;
        self.suggestions.hide();
        self.prefs.save_last_city(query.as_str());
        self.weather.start(query.clone(), self.units());
        Some(query)
    }

    /// Type `text` and submit it in one go.
    pub fn search(&mut self, text: &str) -> Option<Query> {
        self.suggestions.set_input_quietly(text);
        self.submit()
    }

    /// Persist `units`; an active query is fetched again under them.
    pub fn set_units(&mut self, units: UnitSystem) {
        if units == self.units() {
            return;
        }
        self.prefs.save_units(units);

        match self.query() {
            Some(query) => self.weather.start(query, units),
            None => self.state.send_modify(|s| s.units = units),
        }
    }

    pub fn toggle_units(&mut self) -> UnitSystem {
        let units = self.units().toggled();
        self.set_units(units);
        units
    }
}
