//! Display strings for weather values, following the user's unit settings.

use chrono::NaiveDate;

use crate::settings::{TemperatureUnit, WindUnit};

/// `celsius` rounded to whole degrees in the requested unit.
pub fn temperature(celsius: f64, unit: TemperatureUnit) -> String {
    match unit {
        TemperatureUnit::Celsius => format!("{}°C", celsius.round() as i64),
        TemperatureUnit::Fahrenheit => format!("{}°F", (celsius * 9.0 / 5.0 + 32.0).round() as i64),
    }
}

/// `metres_per_second` converted and rounded to whole units.
pub fn wind_speed(metres_per_second: f64, unit: WindUnit) -> String {
    match unit {
        WindUnit::Kmh => format!("{} km/h", (metres_per_second * 3.6).round() as i64),
        WindUnit::Mph => format!("{} mph", (metres_per_second * 2.237).round() as i64),
        WindUnit::Ms => format!("{} m/s", metres_per_second.round() as i64),
    }
}

pub fn population(count: i64) -> String {
    if count == 0 {
        return "Unknown".to_string();
    }
    if count >= 1_000_000 {
        let millions = format!("{:.2}", count as f64 / 1_000_000.0);
        let (whole, fraction) = millions.split_once('.').unwrap_or((millions.as_str(), ""));
        let whole = whole.parse::<i64>().map(group_thousands).unwrap_or_default();
        let fraction = fraction.trim_end_matches('0');
        return if fraction.is_empty() {
            format!("{whole} million")
        } else {
            format!("{whole}.{fraction} million")
        };
    }
    group_thousands(count)
}

/// "Mon, Jun 5".
pub fn date(day: NaiveDate) -> String {
    day.format("%a, %b %-d").to_string()
}

pub fn probability(pop: f64) -> String {
    format!("{}%", (pop * 100.0).round() as i64)
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// Broad family of a provider condition code, used to pick a glyph or colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionFamily {
    Clear,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
    Foggy,
}

impl ConditionFamily {
    pub fn of(main: &str) -> Self {
        let main = main.to_ascii_lowercase();
        let has = |needle: &str| main.contains(needle);
        if has("clear") || has("sun") {
            ConditionFamily::Clear
        } else if has("cloud") {
            ConditionFamily::Cloudy
        } else if has("rain") || has("drizzle") {
            ConditionFamily::Rainy
        } else if has("thunder") || has("storm") {
            ConditionFamily::Stormy
        } else if has("snow") {
            ConditionFamily::Snowy
        } else if has("mist") || has("fog") || has("haze") {
            ConditionFamily::Foggy
        } else {
            ConditionFamily::Clear
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            ConditionFamily::Clear => "☀",
            ConditionFamily::Cloudy => "☁",
            ConditionFamily::Rainy => "☂",
            ConditionFamily::Stormy => "⚡",
            ConditionFamily::Snowy => "❄",
            ConditionFamily::Foggy => "≈",
        }
    }
}

#[cfg(test)]
#[path = "tests/format_tests.rs"]
mod tests;
