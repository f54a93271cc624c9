//! Incremental, sortable, filterable city list.
//!
//! The controller owns the current query and the rows accumulated for it.
//! Pages are fetched one at a time: while a fetch is in flight every other
//! request is a no-op. Changing sort or filter starts a new result set; a
//! response that belongs to an older result set is discarded and the fetch
//! slot moves on to the current query.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::{
    domain::{CityRecord, ContinentFilter, SortDirection, SortKey},
    protocol::DEFAULT_PAGE_SIZE,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{CityQuerySource, ClientError, ListQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Nothing was fetched: a fetch was already running or the list is complete.
    Skipped,
    Loaded { page: u32, received: usize },
}

struct ControllerState {
    query: ListQuery,
    results: Vec<CityRecord>,
    has_more: bool,
    /// Bumped whenever the result set is invalidated.
    generation: u64,
    /// Whether the visibility trigger may fire. Cleared when a page lands,
    /// set again once a new last row is rendered.
    armed: bool,
    rendered_rows: usize,
}

impl ControllerState {
    fn restart(&mut self) {
        self.query.page = 1;
        self.has_more = true;
        self.generation += 1;
        self.armed = true;
        self.rendered_rows = 0;
    }
}

/// Holds the single fetch slot. Released on drop, so a request future that is
/// cancelled mid-fetch does not leave the list stuck in flight.
struct FetchSlot<'a>(&'a AtomicBool);

impl Drop for FetchSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ListController {
    source: Arc<dyn CityQuerySource>,
    page_size: u32,
    in_flight: AtomicBool,
    inner: Mutex<ControllerState>,
}

impl ListController {
    pub fn new(source: Arc<dyn CityQuerySource>) -> Self {
        Self::with_page_size(source, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(source: Arc<dyn CityQuerySource>, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            in_flight: AtomicBool::new(false),
            inner: Mutex::new(ControllerState {
                query: ListQuery::default(),
                results: Vec::new(),
                has_more: true,
                generation: 0,
                armed: true,
                rendered_rows: 0,
            }),
        }
    }

    /// Selecting the current key flips the direction; any other key sorts
    /// ascending.
    pub async fn set_sort(&self, key: SortKey) {
        let mut state = self.inner.lock().await;
        if state.query.sort_key == key {
            state.query.direction = state.query.direction.flipped();
        } else {
            state.query.sort_key = key;
            state.query.direction = SortDirection::Asc;
        }
        state.results.clear();
        state.restart();
        debug!(sort = key.as_str(), direction = state.query.direction.as_str(), "list: sort changed");
    }

    pub async fn set_filter(&self, continent: ContinentFilter) {
        let mut state = self.inner.lock().await;
        state.query.continent = continent;
        state.results.clear();
        state.restart();
        debug!(%continent, "list: filter changed");
    }

    /// Starts over at page 1 with the same query. Rows stay visible until the
    /// first page arrives and replaces them.
    pub async fn refresh(&self) {
        self.inner.lock().await.restart();
    }

    pub async fn request_next_page(&self) -> Result<PageOutcome, ClientError> {
        let (slot, mut query, mut generation) = {
            let state = self.inner.lock().await;
            if !state.has_more || self.in_flight.swap(true, Ordering::AcqRel) {
                return Ok(PageOutcome::Skipped);
            }
            (FetchSlot(&self.in_flight), state.query, state.generation)
        };

        loop {
            let result = self.source.query_cities(&query, self.page_size).await;

            let mut state = self.inner.lock().await;
            if state.generation != generation {
                debug!(page = query.page, "list: dropping page of a superseded query");
                query = state.query;
                generation = state.generation;
                continue;
            }
            drop(slot);

            return match result {
                Ok(page) => {
                    let received = page.cities.len();
                    if query.page == 1 {
                        state.results = page.cities;
                    } else {
                        state.results.extend(page.cities);
                    }
                    state.has_more = page.has_next;
                    state.query.page = query.page + 1;
                    state.armed = false;
                    Ok(PageOutcome::Loaded {
                        page: query.page,
                        received,
                    })
                }
                Err(err) => {
                    warn!(page = query.page, error = %err, "list: page fetch failed");
                    Err(err)
                }
            };
        }
    }

    /// Fires a page request when the last rendered row scrolls into view.
    /// After a page lands, nothing fires again until a new last row is
    /// rendered; after a failure the next call retries.
    pub async fn on_last_row_visible(&self) -> Result<PageOutcome, ClientError> {
        if !self.inner.lock().await.armed {
            return Ok(PageOutcome::Skipped);
        }
        self.request_next_page().await
    }

    pub async fn on_rows_rendered(&self, rows: usize) {
        let mut state = self.inner.lock().await;
        if rows > state.rendered_rows {
            state.rendered_rows = rows;
            state.armed = true;
        }
    }

    pub async fn results(&self) -> Vec<CityRecord> {
        self.inner.lock().await.results.clone()
    }

    pub async fn has_more(&self) -> bool {
        self.inner.lock().await.has_more
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn query(&self) -> ListQuery {
        self.inner.lock().await.query
    }
}

#[cfg(test)]
#[path = "tests/list_controller_tests.rs"]
mod tests;
