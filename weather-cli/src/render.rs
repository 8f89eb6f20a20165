use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use weather_query_core::{ForecastEntry, QueryState, UnitSystem, WeatherSnapshot};

pub fn print_state(state: &QueryState) {
    print!("{}", format_state(state, Utc::now()));
}

/// Plain-text view of the lookup; `now` decides day/night.
pub fn format_state(state: &QueryState, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let request = &state.request;

    if let Some(error) = &request.error {
        let _ = writeln!(out, "{error}");
        return out;
    }

    let Some(snapshot) = &request.snapshot else {
        if request.loading {
            out.push_str("Loading...\n");
        }
        return out;
    };

    write_snapshot(&mut out, snapshot, now);

    if !request.forecast.is_empty() {
        out.push_str("\n5-day outlook (midday):\n");
        for entry in &request.forecast {
            write_forecast_line(&mut out, snapshot, entry, state.units);
        }
    }

    out
}

fn write_snapshot(out: &mut String, snapshot: &WeatherSnapshot, now: DateTime<Utc>) {
    let units = snapshot.units;
    let r = &snapshot.reading;
    let description = r
        .condition
        .as_ref()
        .map(|c| c.description.as_str())
        .unwrap_or("unknown");
    let period = if snapshot.is_night_at(now) { "night" } else { "day" };

    let _ = writeln!(out, "{}, {} ({period})", snapshot.location_name, snapshot.country);
    let _ = writeln!(
        out,
        "  {:.1}{} (feels like {:.1}{}), {description}",
        r.temperature,
        units.temperature_symbol(),
        r.feels_like,
        units.temperature_symbol(),
    );
    let _ = writeln!(
        out,
        "  Humidity {}%  Wind {:.1} {}  Pressure {} hPa  Clouds {}%",
        r.humidity_pct,
        r.wind_speed,
        units.speed_symbol(),
        r.pressure_hpa,
        r.cloudiness_pct,
    );
    if let Some(visibility) = r.visibility_m {
        let _ = writeln!(out, "  Visibility {:.1} km", f64::from(visibility) / 1000.0);
    }
    let _ = writeln!(
        out,
        "  Coordinates {:.2}, {:.2}",
        snapshot.latitude, snapshot.longitude
    );
    let _ = writeln!(
        out,
        "  Sunrise {}  Sunset {}",
        snapshot.local_time(snapshot.sunrise).format("%H:%M"),
        snapshot.local_time(snapshot.sunset).format("%H:%M"),
    );
}

fn write_forecast_line(
    out: &mut String,
    snapshot: &WeatherSnapshot,
    entry: &ForecastEntry,
    units: UnitSystem,
) {
    let description = entry
        .reading
        .condition
        .as_ref()
        .map(|c| c.description.as_str())
        .unwrap_or("-");
    let _ = writeln!(
        out,
        "  {}  {:>6.1}{}  {description}",
        snapshot.local_time(entry.at).format("%a %d %b"),
        entry.reading.temperature,
        units.temperature_symbol(),
    );
}
