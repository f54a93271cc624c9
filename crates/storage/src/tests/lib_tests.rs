use super::*;

fn city(id: &str) -> CityId {
    CityId::new(id)
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("favorites.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn adds_and_reports_favorites() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let paris = city("2988507");

    assert!(!storage.is_favorite(&paris).await.expect("lookup"));
    let stored = storage
        .add_favorite(&paris, "Paris", "France")
        .await
        .expect("add");
    assert_eq!(stored.city_id, paris);
    assert_eq!(stored.country, "France");
    assert!(storage.is_favorite(&paris).await.expect("lookup"));
}

#[tokio::test]
async fn adding_twice_keeps_one_row_and_refreshes_names() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let tokyo = city("1850147");

    let first = storage
        .add_favorite(&tokyo, "Tokyo", "Japan")
        .await
        .expect("first add");
    let second = storage
        .add_favorite(&tokyo, "Tōkyō", "Japan")
        .await
        .expect("second add");

    assert_eq!(second.added_at, first.added_at);
    let favorites = storage.list_favorites().await.expect("list");
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].name, "Tōkyō");
}

#[tokio::test]
async fn removes_favorites() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let london = city("2643743");
    storage
        .add_favorite(&london, "London", "United Kingdom")
        .await
        .expect("add");

    assert!(storage.remove_favorite(&london).await.expect("remove"));
    assert!(!storage.remove_favorite(&london).await.expect("second remove"));
    assert!(!storage.is_favorite(&london).await.expect("lookup"));
}

#[tokio::test]
async fn lists_most_recent_first() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    for (id, name) in [("1", "Oslo"), ("2", "Lima"), ("3", "Pune")] {
        storage
            .add_favorite(&city(id), name, "Somewhere")
            .await
            .expect("add");
    }

    let names: Vec<String> = storage
        .list_favorites()
        .await
        .expect("list")
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, vec!["Pune", "Lima", "Oslo"]);
}

#[tokio::test]
async fn toggle_flips_membership() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let sydney = city("2147714");

    assert!(storage
        .toggle_favorite(&sydney, "Sydney", "Australia")
        .await
        .expect("toggle on"));
    assert!(storage.is_favorite(&sydney).await.expect("lookup"));

    assert!(!storage
        .toggle_favorite(&sydney, "Sydney", "Australia")
        .await
        .expect("toggle off"));
    assert!(!storage.is_favorite(&sydney).await.expect("lookup"));
}

#[tokio::test]
async fn seeds_only_empty_table() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let seeded = storage
        .seed_favorites(&DEFAULT_FAVORITES)
        .await
        .expect("seed");
    assert_eq!(seeded, DEFAULT_FAVORITES.len());

    let again = storage
        .seed_favorites(&DEFAULT_FAVORITES)
        .await
        .expect("reseed");
    assert_eq!(again, 0);
    assert_eq!(
        storage.list_favorites().await.expect("list").len(),
        DEFAULT_FAVORITES.len()
    );
}
