use std::collections::HashSet;
use std::sync::Arc;

use crate::capability::Directory;
use crate::config::HarvesterConfig;
use crate::fixtures::FixtureStore;
use crate::model::{BusinessRecord, CategoryFilter};
use crate::signal::{guarded, pause, Stop};

pub struct BusinessLookup {
    store: Arc<FixtureStore>,
    directory: Arc<dyn Directory>,
    min_results: usize,
    latency_ms: u64,
}

impl BusinessLookup {
    pub fn new(
        store: Arc<FixtureStore>,
        directory: Arc<dyn Directory>,
        config: &HarvesterConfig,
    ) -> Self {
        Self {
            store,
            directory,
            min_results: config.min_results,
            latency_ms: config.latency.lookup_ms,
        }
    }

    /// Fixture records in `postal_code`, restaurants before hotels
    pub fn local_matches(&self, postal_code: &str, filter: CategoryFilter) -> Vec<BusinessRecord> {
        filter
            .categories()
            .iter()
            .flat_map(|&c| self.store.by_category(c))
            .filter(|r| r.postal_code.as_deref() == Some(postal_code))
            .cloned()
            .collect()
    }

    /// Businesses for one postal code, topped up from the directory when
    /// fewer than the configured minimum are known locally.
    ///
    /// Only fails when stopped.
    pub async fn lookup(
        &self,
        postal_code: &str,
        filter: CategoryFilter,
        stop: &Stop,
    ) -> anyhow::Result<Vec<BusinessRecord>> {
        pause(self.latency_ms, stop).await?;

        let mut results = self.local_matches(postal_code, filter);
        if results.len() >= self.min_results {
            return Ok(results);
        }

        let supplemental =
            match guarded(self.directory.search_directory(postal_code, filter), stop).await? {
                Ok(records) => records,
                Err(e) => {
                    log::warn!("Directory search failed for {postal_code} got: {e}");
                    vec![]
                }
            };

        let mut names: HashSet<String> = results.iter().map(|r| r.name.clone()).collect();
        let before = results.len();
        results.extend(
            supplemental
                .into_iter()
                .filter(|r| filter.matches(r.category))
                .filter(|r| names.insert(r.name.clone()))
                .map(|r| r.with_postal_code(postal_code)),
        );
        log::debug!(
            "Postal code {postal_code}: {before} local, {} from directory",
            results.len() - before
        );

        Ok(results)
    }
}
