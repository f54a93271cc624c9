//! Collapses 3-hour forecast samples into one summary per calendar day.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::WeatherCondition;

/// One 3-hour forecast record as delivered by the weather provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSample {
    pub timestamp: NaiveDateTime,
    pub temp_max: f64,
    pub temp_min: f64,
    pub condition: WeatherCondition,
    /// Probability of precipitation in `[0, 1]`.
    pub pop: f64,
    pub humidity: i64,
    /// Metres per second.
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub day_name: String,
    pub temp_max: f64,
    pub temp_min: f64,
    pub condition: WeatherCondition,
    pub pop: f64,
    pub humidity: f64,
    pub wind: f64,
}

impl DailySummary {
    fn start(date: NaiveDate, sample: &WeatherSample) -> Self {
        Self {
            date,
            day_name: date.format("%a").to_string(),
            temp_max: sample.temp_max,
            temp_min: sample.temp_min,
            condition: sample.condition.clone(),
            pop: sample.pop,
            humidity: sample.humidity as f64,
            wind: sample.wind_speed,
        }
    }

    // pop/humidity/wind fold pairwise into the running value: order dependent,
    // not the arithmetic mean of the day.
    fn absorb(&mut self, sample: &WeatherSample) {
        self.temp_max = self.temp_max.max(sample.temp_max);
        self.temp_min = self.temp_min.min(sample.temp_min);
        self.pop = (self.pop + sample.pop) / 2.0;
        self.humidity = (self.humidity + sample.humidity as f64) / 2.0;
        self.wind = (self.wind + sample.wind_speed) / 2.0;
    }
}

/// Groups `samples` by the date part of their timestamp and returns one
/// summary per date, ascending. Samples of the same date are folded in input
/// order; the first one decides the day's condition.
pub fn aggregate(samples: &[WeatherSample]) -> Vec<DailySummary> {
    let mut days: BTreeMap<NaiveDate, DailySummary> = BTreeMap::new();

    for sample in samples {
        let date = sample.timestamp.date();
        match days.get_mut(&date) {
            Some(summary) => summary.absorb(sample),
            None => {
                days.insert(date, DailySummary::start(date, sample));
            }
        }
    }

    days.into_values().collect()
}

#[cfg(test)]
#[path = "tests/forecast_tests.rs"]
mod tests;
