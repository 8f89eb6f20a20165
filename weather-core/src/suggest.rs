//! Debounced autocomplete.
//!
//! Every input change starts a new generation. The task for a generation
//! waits out the debounce window, asks the provider for places and publishes
//! them, all as one cancellable unit: a newer input cancels the token, which
//! drops the pending sleep or the in-flight request. The generation stored in
//! [`SuggestionState`] is checked under the channel's write lock before every
//! mutation, so a task that slipped past cancellation still cannot publish.

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Settings,
    model::{Suggestion, SuggestionState},
    provider::WeatherProvider,
};

/// Trimmed input shorter than this never reaches the provider.
pub const MIN_INPUT_CHARS: usize = 2;

#[derive(Debug)]
pub struct SuggestionFetcher {
    provider: Arc<dyn WeatherProvider>,
    settings: Settings,
    state: Arc<watch::Sender<SuggestionState>>,
    pending: Option<CancellationToken>,
}

impl SuggestionFetcher {
    pub fn new(provider: Arc<dyn WeatherProvider>, settings: Settings) -> Self {
        let (tx, _rx) = watch::channel(SuggestionState::default());
        Self {
            provider,
            settings,
            state: Arc::new(tx),
            pending: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SuggestionState {
        self.state.borrow().clone()
    }

    /// React to the text box changing. Must be called inside a tokio runtime.
    pub fn on_input(&mut self, input: &str) {
        let generation = self.restart(input);
        let text = input.trim().to_string();

        if text.chars().count() < MIN_INPUT_CHARS {
            self.state.send_modify(|s| {
                s.items.clear();
                s.visible = false;
                s.loading = false;
                s.pending = false;
            });
            return;
        }

        self.state.send_modify(|s| s.pending = true);
        let token = CancellationToken::new();
        self.pending = Some(token.clone());

        tokio::spawn(run(
            Arc::clone(&self.provider),
            Arc::clone(&self.state),
            generation,
            text,
            self.settings,
            token,
        ));
    }

    /// Replace the text without looking anything up, hiding the list.
    pub fn set_input_quietly(&mut self, input: &str) {
        self.restart(input);
        self.hide();
    }

    /// Take the suggestion at `index`, put its label in the text box and close
    /// the list. Nothing can be picked from a hidden list.
    pub fn pick(&mut self, index: usize) -> Option<Suggestion> {
        let picked = {
            let state = self.state.borrow();
            if !state.visible {
                return None;
            }
            state.items.get(index).cloned()?
        };
        self.set_input_quietly(&picked.label());
        Some(picked)
    }

    /// Close the list and forget its items.
    pub fn hide(&mut self) {
        self.cancel();
        self.state.send_modify(|s| {
            s.items.clear();
            s.visible = false;
            s.loading = false;
            s.pending = false;
        });
    }

    fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }

    /// Cancel whatever is pending and open a new generation for `input`.
    fn restart(&mut self, input: &str) -> u64 {
        self.cancel();
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            s.input = input.to_string();
            generation = s.generation;
        });
        generation
    }
}

impl Drop for SuggestionFetcher {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run(
    provider: Arc<dyn WeatherProvider>,
    state: Arc<watch::Sender<SuggestionState>>,
    generation: u64,
    text: String,
    settings: Settings,
    token: CancellationToken,
) {
    tokio::select! {
        biased;
        _ = token.cancelled() => return,
        _ = tokio::time::sleep(settings.debounce) => {}
    }

    if !apply(&state, generation, |s| s.loading = true) {
        return;
    }

    tracing::debug!(%text, generation, "Fetching suggestions");

    let result = tokio::select! {
        biased;
        _ = token.cancelled() => {
            tracing::trace!(%text, generation, "Suggestion request aborted");
            return;
        }
        result = provider.geocode(&text, settings.suggestion_limit) => result,
    };

    let items = match result {
        Ok(mut items) => {
            items.truncate(settings.suggestion_limit);
            items
        }
        Err(e) => {
            // Typing races and flaky lookups are not worth surfacing.
            tracing::debug!(%text, error = %e, "Suggestion lookup failed");
            Vec::new()
        }
    };

    apply(&state, generation, |s| {
        s.loading = false;
        s.pending = false;
        s.visible = !items.is_empty();
        s.items = items;
    });
}

/// Mutate only if `generation` is still the latest. Returns whether it was.
fn apply(
    state: &watch::Sender<SuggestionState>,
    generation: u64,
    f: impl FnOnce(&mut SuggestionState),
) -> bool {
    state.send_if_modified(|s| {
        if s.generation != generation {
            return false;
        }
        f(s);
        true
    })
}
