use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::{domain::CityRecord, protocol::DEFAULT_SEARCH_LIMIT};
use tracing::debug;

use crate::{CityQuerySource, ClientError};

/// Inputs shorter than this never reach the network.
pub const MIN_INPUT_CHARS: usize = 3;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct CitySearch {
    source: Arc<dyn CityQuerySource>,
    limit: u32,
    debounce: Duration,
    latest: AtomicU64,
}

impl CitySearch {
    pub fn new(source: Arc<dyn CityQuerySource>) -> Self {
        Self {
            source,
            limit: DEFAULT_SEARCH_LIMIT,
            debounce: DEFAULT_DEBOUNCE,
            latest: AtomicU64::new(0),
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub async fn search(&self, text: &str) -> Result<Vec<CityRecord>, ClientError> {
        let text = text.trim();
        if text.chars().count() < MIN_INPUT_CHARS {
            return Ok(Vec::new());
        }
        self.source.search_cities(text, self.limit).await
    }

    /// Keystroke entry point. Waits for the debounce interval and returns
    /// `None` when a later keystroke arrived in the meantime.
    pub async fn search_as_typed(
        &self,
        text: &str,
    ) -> Result<Option<Vec<CityRecord>>, ClientError> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.debounce).await;
        if self.latest.load(Ordering::SeqCst) != ticket {
            debug!(text, "search: superseded keystroke");
            return Ok(None);
        }
        self.search(text).await.map(Some)
    }
}

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod tests;
