//! Current conditions plus best-effort daily forecast for the active query.

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    forecast::select_daily,
    model::{Query, QueryState, RequestState, UnitSystem},
    provider::WeatherProvider,
};

#[derive(Debug)]
pub struct WeatherFetcher {
    provider: Arc<dyn WeatherProvider>,
    state: Arc<watch::Sender<QueryState>>,
    pending: Option<CancellationToken>,
}

impl WeatherFetcher {
    pub fn new(provider: Arc<dyn WeatherProvider>, state: Arc<watch::Sender<QueryState>>) -> Self {
        Self {
            provider,
            state,
            pending: None,
        }
    }

    /// Start over for `query` under `units`.
    ///
    /// The previous lookup is cancelled and the request state is reset to
    /// loading before this returns. Must be called inside a tokio runtime.
    pub fn start(&mut self, query: Query, units: UnitSystem) {
        self.cancel();

        let mut generation = 0;
        self.state.send_modify(|s| {
            s.query = Some(query.clone());
            s.units = units;
            s.request = RequestState {
                generation: s.request.generation + 1,
                loading: true,
                ..RequestState::default()
            };
            generation = s.request.generation;
        });

        let token = CancellationToken::new();
        self.pending = Some(token.clone());

        tokio::spawn(run(
            Arc::clone(&self.provider),
            Arc::clone(&self.state),
            generation,
            query,
            units,
            token,
        ));
    }

    fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl Drop for WeatherFetcher {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run(
    provider: Arc<dyn WeatherProvider>,
    state: Arc<watch::Sender<QueryState>>,
    generation: u64,
    query: Query,
    units: UnitSystem,
    token: CancellationToken,
) {
    tracing::debug!(%query, %units, generation, "Fetching current weather");

    let current = tokio::select! {
        biased;
        _ = token.cancelled() => return,
        result = provider.current(&query, units) => result,
    };

    let snapshot = match current {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(%query, error = %e, "Weather lookup failed");
            let message = format!("Could not load weather: {}", e.user_message());
            apply(&state, generation, |r| {
                r.loading = false;
                r.snapshot = None;
                r.error = Some(message);
            });
            return;
        }
    };

    let applied = apply(&state, generation, |r| {
        r.loading = false;
        r.error = None;
        r.snapshot = Some(snapshot);
        r.forecast_loading = true;
    });
    if !applied {
        return;
    }

    let forecast = tokio::select! {
        biased;
        _ = token.cancelled() => return,
        result = provider.forecast(&query, units) => result,
    };

    let daily = match forecast {
        Ok(raw) => select_daily(raw),
        Err(e) => {
            // The snapshot alone is still worth showing.
            tracing::debug!(%query, error = %e, "Forecast lookup failed, leaving it empty");
            Vec::new()
        }
    };

    apply(&state, generation, |r| {
        r.forecast_loading = false;
        r.forecast = daily;
    });
}

/// Mutate the request state only while `generation` owns it.
fn apply(
    state: &watch::Sender<QueryState>,
    generation: u64,
    f: impl FnOnce(&mut RequestState),
) -> bool {
    state.send_if_modified(|s| {
        if s.request.generation != generation {
            return false;
        }
        f(&mut s.request);
        true
    })
}
