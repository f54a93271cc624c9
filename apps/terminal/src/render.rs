use client_core::{
    format::{self, ConditionFamily},
    CityDetail, Settings,
};
use shared::domain::{CityRecord, Favorite};

pub fn print_header() {
    println!(
        "{:>4}  {:<28} {:<24} {:>18}  {:<24} {}",
        "#", "City", "Country", "Population", "Timezone", "Weather"
    );
}

pub fn print_rows(rows: &[CityRecord], from: usize, settings: &Settings) {
    for (index, city) in rows.iter().enumerate().skip(from) {
        let weather = city
            .weather
            .as_ref()
            .map(|w| {
                format!(
                    "{} {} {}",
                    ConditionFamily::of(&w.main).glyph(),
                    format::temperature(w.temp, settings.temp_unit),
                    w.description
                )
            })
            .unwrap_or_default();
        println!(
            "{:>4}  {:<28} {:<24} {:>18}  {:<24} {}",
            index + 1,
            city.name,
            city.country,
            format::population(city.population),
            city.timezone,
            weather
        );
    }
}

pub fn print_detail(detail: &CityDetail, settings: &Settings) {
    let city = &detail.city;
    let current = &detail.current;
    let star = if detail.is_favorite { " ★" } else { "" };

    println!("{}, {}{star}", city.name, city.country);
    println!(
        "  id {}  ·  {}  ·  population {}  ·  {:.4}, {:.4}",
        city.id,
        city.timezone,
        format::population(city.population),
        city.coordinates.lat,
        city.coordinates.lon
    );
    println!();
    println!(
        "  {} {}  {} (feels like {})",
        ConditionFamily::of(&current.condition.main).glyph(),
        current.condition.description,
        format::temperature(current.temp, settings.temp_unit),
        format::temperature(current.feels_like, settings.temp_unit)
    );
    println!(
        "  low {}  high {}  humidity {}%  pressure {} hPa",
        format::temperature(current.temp_min, settings.temp_unit),
        format::temperature(current.temp_max, settings.temp_unit),
        current.humidity,
        current.pressure
    );
    println!(
        "  wind {} at {}°  clouds {}%{}",
        format::wind_speed(current.wind_speed, settings.wind_unit),
        current.wind_deg,
        current.cloudiness,
        current
            .visibility
            .map(|v| format!("  visibility {:.1} km", v as f64 / 1000.0))
            .unwrap_or_default()
    );
    if let (Some(sunrise), Some(sunset)) = (current.sunrise, current.sunset) {
        println!(
            "  sunrise {} UTC  sunset {} UTC",
            sunrise.format("%H:%M"),
            sunset.format("%H:%M")
        );
    }

    println!();
    for day in &detail.forecast {
        println!(
            "  {:<12} {} {:<16} {:>6} / {:<6} rain {:>4}  humidity {:>3}%  wind {}",
            format::date(day.date),
            ConditionFamily::of(&day.condition.main).glyph(),
            day.condition.main,
            format::temperature(day.temp_max, settings.temp_unit),
            format::temperature(day.temp_min, settings.temp_unit),
            format::probability(day.pop),
            day.humidity.round() as i64,
            format::wind_speed(day.wind, settings.wind_unit)
        );
    }
}

pub fn print_favorites(favorites: &[Favorite]) {
    if favorites.is_empty() {
        println!("no favorite cities yet");
        return;
    }
    for favorite in favorites {
        println!(
            "{:<10} {:<28} {:<24} added {}",
            favorite.city_id.as_str(),
            favorite.name,
            favorite.country,
            favorite.added_at.format("%Y-%m-%d %H:%M")
        );
    }
}

pub fn print_settings(settings: &Settings) {
    println!("temperature unit: {}", settings.temp_unit);
    println!("wind unit:        {}", settings.wind_unit);
    println!("theme:            {}", settings.theme);
}
