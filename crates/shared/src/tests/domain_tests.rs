use super::*;

#[test]
fn parses_sort_keys_including_dataset_alias() {
    assert_eq!("population".parse::<SortKey>(), Ok(SortKey::Population));
    assert_eq!("cou_name_en".parse::<SortKey>(), Ok(SortKey::Country));
    assert_eq!(" Name ".parse::<SortKey>(), Ok(SortKey::Name));
    assert!("elevation".parse::<SortKey>().is_err());
}

#[test]
fn flips_sort_direction() {
    assert_eq!(SortDirection::Asc.flipped(), SortDirection::Desc);
    assert_eq!(SortDirection::Desc.flipped(), SortDirection::Asc);
}

#[test]
fn parses_continent_filter_variants() {
    assert_eq!("all".parse::<ContinentFilter>(), Ok(ContinentFilter::All));
    assert_eq!("".parse::<ContinentFilter>(), Ok(ContinentFilter::All));
    assert_eq!(
        "north_america".parse::<ContinentFilter>(),
        Ok(ContinentFilter::Only(Continent::NorthAmerica))
    );
    assert_eq!(
        "South America".parse::<ContinentFilter>(),
        Ok(ContinentFilter::Only(Continent::SouthAmerica))
    );
    assert!("Atlantis".parse::<ContinentFilter>().is_err());
}

#[test]
fn continent_filter_serializes_as_display_name() {
    let json = serde_json::to_string(&ContinentFilter::Only(Continent::NorthAmerica))
        .expect("serialize");
    assert_eq!(json, "\"North America\"");

    let parsed: ContinentFilter = serde_json::from_str("\"all\"").expect("deserialize");
    assert_eq!(parsed, ContinentFilter::All);
}

#[test]
fn city_record_omits_missing_weather() {
    let city = CityRecord {
        id: CityId::new("2988507"),
        name: "Paris".into(),
        country: "France".into(),
        timezone: "Europe/Paris".into(),
        population: 2_138_551,
        coordinates: Coordinates {
            lat: 48.85341,
            lon: 2.3488,
        },
        weather: None,
    };
    let value = serde_json::to_value(&city).expect("serialize");
    assert_eq!(value["id"], "2988507");
    assert!(value.get("weather").is_none());
}
