use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{CityId, Favorite};

/// Cities preloaded into an empty favorites table by `seed_favorites`.
pub const DEFAULT_FAVORITES: [(&str, &str, &str); 5] = [
    ("5128581", "New York", "United States"),
    ("2643743", "London", "United Kingdom"),
    ("1850147", "Tokyo", "Japan"),
    ("2988507", "Paris", "France"),
    ("2147714", "Sydney", "Australia"),
];

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // every connection to `sqlite::memory:` opens its own database
        let in_memory = database_url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Inserts the favorite, or refreshes its name and country when the city is
    /// already stored. The original `added_at` is kept in that case.
    pub async fn add_favorite(
        &self,
        city_id: &CityId,
        name: &str,
        country: &str,
    ) -> Result<Favorite> {
        let row = sqlx::query(
            "INSERT INTO favorites (city_id, name, country, added_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(city_id) DO UPDATE SET name=excluded.name, country=excluded.country
             RETURNING city_id, name, country, added_at",
        )
        .bind(city_id.as_str())
        .bind(name)
        .bind(country)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to store favorite city {city_id}"))?;
        Ok(favorite_from_row(&row))
    }

    /// Returns whether a row was deleted.
    pub async fn remove_favorite(&self, city_id: &CityId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE city_id = ?")
            .bind(city_id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to remove favorite city {city_id}"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Most recently added first.
    pub async fn list_favorites(&self) -> Result<Vec<Favorite>> {
        let rows = sqlx::query(
            "SELECT city_id, name, country, added_at
             FROM favorites
             ORDER BY added_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list favorites")?;
        Ok(rows.iter().map(favorite_from_row).collect())
    }

    pub async fn is_favorite(&self, city_id: &CityId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM favorites WHERE city_id = ?")
            .bind(city_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Flips the favorite state of a city and returns the new state.
    pub async fn toggle_favorite(
        &self,
        city_id: &CityId,
        name: &str,
        country: &str,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM favorites WHERE city_id = ?")
            .bind(city_id.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            sqlx::query(
                "INSERT INTO favorites (city_id, name, country, added_at) VALUES (?, ?, ?, ?)",
            )
            .bind(city_id.as_str())
            .bind(name)
            .bind(country)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .with_context(|| format!("failed to toggle favorite city {city_id}"))?;
        Ok(removed == 0)
    }

    /// Inserts `entries` only when the table is empty. Returns how many rows were added.
    pub async fn seed_favorites(&self, entries: &[(&str, &str, &str)]) -> Result<usize> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites")
            .fetch_one(&self.pool)
            .await?;
        if existing > 0 {
            tracing::info!(existing, "favorites already present, skipping seed");
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for (city_id, name, country) in entries {
            sqlx::query(
                "INSERT INTO favorites (city_id, name, country, added_at) VALUES (?, ?, ?, ?)",
            )
            .bind(*city_id)
            .bind(*name)
            .bind(*country)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await.context("failed to seed favorites")?;

        tracing::info!(count = entries.len(), "seeded favorites");
        Ok(entries.len())
    }
}

fn favorite_from_row(row: &SqliteRow) -> Favorite {
    Favorite {
        city_id: CityId(row.get::<String, _>(0)),
        name: row.get::<String, _>(1),
        country: row.get::<String, _>(2),
        added_at: row.get::<DateTime<Utc>, _>(3),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.contains(":memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
