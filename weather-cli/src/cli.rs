use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{InquireError, Password, Select, Text};
use weather_query_core::{
    Config, FileStorage, MemoryStorage, Orchestrator, Preferences, QueryState, Storage,
    SuggestionState, UnitSystem, provider_from_config,
};

use crate::render;

/// Upper bound on how long a single lookup may keep the terminal waiting.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Units {
    Metric,
    Imperial,
}

impl From<Units> for UnitSystem {
    fn from(value: Units) -> Self {
        match value {
            Units::Metric => UnitSystem::Metric,
            Units::Imperial => UnitSystem::Imperial,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Show current weather and the 5-day outlook.
    Show {
        /// City to look up; defaults to the last one searched.
        city: Option<String>,

        /// Unit system for this and future lookups.
        #[arg(long, value_enum)]
        units: Option<Units>,
    },

    /// List place suggestions for partial text.
    Suggest {
        text: String,
    },

    /// Print or change the saved unit preference.
    Units {
        #[arg(value_enum)]
        units: Option<Units>,
    },

    /// Search repeatedly with autocomplete.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, units } => show(city, units.map(Into::into)).await,
            Command::Suggest { text } => suggest(&text).await,
            Command::Units { units } => {
                let prefs = Preferences::new(storage());
                match units {
                    Some(units) => {
                        let units = UnitSystem::from(units);
                        prefs.save_units(units);
                        println!("Units set to {units}");
                    }
                    None => println!("{}", prefs.units().unwrap_or_default()),
                }
                Ok(())
            }
            Command::Interactive => interactive().await,
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }

    config.set_api_key(api_key);
    config.save()?;

    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Durable storage when the platform has a data directory, memory otherwise.
fn storage() -> Arc<dyn Storage> {
    match FileStorage::default_location() {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            tracing::warn!(error = %e, "Preferences will not survive this session");
            Arc::new(MemoryStorage::new())
        }
    }
}

fn orchestrator() -> Result<Orchestrator> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    Ok(Orchestrator::new(provider, storage(), config.settings()))
}

/// Like [`orchestrator`], but without fetching the remembered city.
fn orchestrator_for_new_city() -> Result<Orchestrator> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    Ok(Orchestrator::without_last_city(provider, storage(), config.settings()))
}

async fn show(city: Option<String>, units: Option<UnitSystem>) -> Result<()> {
    let mut orchestrator = match city {
        Some(_) => orchestrator_for_new_city()?,
        None => orchestrator()?,
    };

    if let Some(units) = units {
        orchestrator.set_units(units);
    }
    if let Some(city) = city {
        orchestrator
            .search(&city)
            .ok_or_else(|| anyhow!("City must not be empty"))?;
    }

    if orchestrator.query().is_none() {
        return Err(anyhow!(
            "No city given and none remembered.\n\
             Hint: run `weather show <city>`."
        ));
    }

    let state = wait_settled(&orchestrator).await?;
    if let Some(error) = state.request.error {
        return Err(anyhow!(error));
    }

    render::print_state(&state);
    Ok(())
}

async fn suggest(text: &str) -> Result<()> {
    let mut orchestrator = orchestrator()?;
    let state = lookup_suggestions(&mut orchestrator, text).await?;

    if state.items.is_empty() {
        println!("No matches.");
    }
    for item in &state.items {
        println!("{}", item.label());
    }
    Ok(())
}

async fn interactive() -> Result<()> {
    let mut orchestrator = orchestrator()?;

    if orchestrator.query().is_some() {
        render::print_state(&wait_settled(&orchestrator).await?);
    }

    loop {
        let prompt = format!("City ({}; 'u' toggles units, Esc quits):", orchestrator.units());
        let text = match Text::new(&prompt).prompt() {
            Ok(text) => text,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e).context("Failed to read input"),
        };

        if text.trim() == "u" {
            let units = orchestrator.toggle_units();
            println!("Units: {units}");
            if orchestrator.query().is_some() {
                render::print_state(&wait_settled(&orchestrator).await?);
            }
            continue;
        }

        let suggestions = lookup_suggestions(&mut orchestrator, &text).await?;

        if suggestions.items.is_empty() {
            if orchestrator.submit().is_none() {
                continue;
            }
        } else {
            let mut options: Vec<String> = suggestions.items.iter().map(|s| s.label()).collect();
            options.push(format!("Search for \"{}\"", text.trim()));

            let choice = match Select::new("Did you mean:", options).raw_prompt() {
                Ok(choice) => choice,
                Err(InquireError::OperationCanceled) => continue,
                Err(InquireError::OperationInterrupted) => break,
                Err(e) => return Err(e).context("Failed to read selection"),
            };

            if choice.index < suggestions.items.len() {
                orchestrator.pick_suggestion(choice.index);
            } else {
                orchestrator.submit();
            }
        }

        render::print_state(&wait_settled(&orchestrator).await?);
    }

    Ok(())
}

/// Type `text` and wait for the debounced lookup for it to finish.
async fn lookup_suggestions(
    orchestrator: &mut Orchestrator,
    text: &str,
) -> Result<SuggestionState> {
    let mut rx = orchestrator.subscribe_suggestions();
    orchestrator.input(text);

    let state = tokio::time::timeout(LOOKUP_TIMEOUT, rx.wait_for(|s| !s.pending))
        .await
        .context("Timed out waiting for suggestions")?
        .context("Suggestion state closed")?
        .clone();

    Ok(state)
}

async fn wait_settled(orchestrator: &Orchestrator) -> Result<QueryState> {
    let mut rx = orchestrator.subscribe();
    let state = tokio::time::timeout(LOOKUP_TIMEOUT, rx.wait_for(|s| s.request.is_settled()))
        .await
        .context("Timed out waiting for weather")?
        .context("Weather state closed")?
        .clone();
    Ok(state)
}
