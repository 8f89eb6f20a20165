//! Daily forecast selection from the API's 3-hour slot list.

use crate::model::ForecastEntry;

/// Slot label fragment marking the midday reading.
pub const MIDDAY_SLOT: &str = "12:00:00";

/// Number of days shown.
pub const FORECAST_DAYS: usize = 5;

/// Keep the midday slot of each day, oldest first, at most [`FORECAST_DAYS`].
///
/// Fewer midday slots than that simply yield a shorter list.
pub fn select_daily(mut entries: Vec<ForecastEntry>) -> Vec<ForecastEntry> {
    entries.retain(|e| e.slot.contains(MIDDAY_SLOT));
    entries.sort_by_key(|e| e.at);
    entries.truncate(FORECAST_DAYS);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Reading;
    use chrono::{Duration, TimeZone, Utc};

    fn entry(day: i64, hour: i64) -> ForecastEntry {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
            + Duration::days(day)
            + Duration::hours(hour);
        ForecastEntry {
            at,
            slot: at.format("%Y-%m-%d %H:%M:%S").to_string(),
            reading: Reading {
                condition: None,
                temperature: hour as f64,
                feels_like: hour as f64,
                humidity_pct: 50,
                pressure_hpa: 1013,
                wind_speed: 1.0,
                wind_deg: None,
                visibility_m: None,
                cloudiness_pct: 0,
            },
        }
    }

    #[test]
    fn picks_one_noon_entry_per_day_for_five_days() {
        let raw: Vec<_> = (0..6)
            .flat_map(|day| [0, 6, 12, 18].map(|hour| entry(day, hour)))
            .collect();

        let daily = select_daily(raw);

        assert_eq!(daily.len(), 5);
        for (i, e) in daily.iter().enumerate() {
            assert!(e.slot.ends_with("12:00:00"));
            assert_eq!(e.at, entry(i as i64, 12).at);
        }
    }

    #[test]
    fn fewer_days_are_returned_as_is() {
        let raw = vec![entry(0, 9), entry(0, 12), entry(1, 12), entry(1, 15)];
        let daily = select_daily(raw);
        assert_eq!(daily.len(), 2);
    }

    #[test]
    fn out_of_order_input_comes_back_chronological() {
        let raw = vec![entry(2, 12), entry(0, 12), entry(1, 12)];
        let daily = select_daily(raw);
        let days: Vec<_> = daily.iter().map(|e| e.at).collect();
        assert_eq!(days, vec![entry(0, 12).at, entry(1, 12).at, entry(2, 12).at]);
    }

    #[test]
    fn no_midday_slots_is_empty_not_an_error() {
        assert!(select_daily(vec![entry(0, 3), entry(0, 21)]).is_empty());
        assert!(select_daily(Vec::new()).is_empty());
    }
}
