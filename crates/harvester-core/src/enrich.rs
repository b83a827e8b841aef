use std::sync::Arc;

use crate::capability::{Crawl, WebsiteFinder};
use crate::config::HarvesterConfig;
use crate::fixtures::FixtureStore;
use crate::model::{BusinessId, BusinessRecord};
use crate::signal::{guarded, pause, Stop};

/// Owners that look like registered companies rather than people
pub fn is_company_owner(owner: &str) -> bool {
    owner.to_lowercase().contains("gmbh")
}

pub struct Enricher {
    store: Arc<FixtureStore>,
    crawler: Arc<dyn Crawl>,
    finder: Arc<dyn WebsiteFinder>,
    latency_ms: u64,
    enrich_unlisted: bool,
}

impl Enricher {
    pub fn new(
        store: Arc<FixtureStore>,
        crawler: Arc<dyn Crawl>,
        finder: Arc<dyn WebsiteFinder>,
        config: &HarvesterConfig,
    ) -> Self {
        Self {
            store,
            crawler,
            finder,
            latency_ms: config.latency.enrich_ms,
            enrich_unlisted: config.enrich_unlisted,
        }
    }

    /// Enriches the stored record with `id`.
    ///
    /// `Ok(None)` when the id is not in the store. Only fails when stopped.
    pub async fn extract_business_data(
        &self,
        id: BusinessId,
        stop: &Stop,
    ) -> anyhow::Result<Option<BusinessRecord>> {
        pause(self.latency_ms, stop).await?;
        let Some(record) = self.store.get(id) else {
            log::info!("Business with id {id} not found");
            return Ok(None);
        };
        log::info!("Extracting data for business: {}", record.name);
        self.enrich_record(record, stop).await.map(Some)
    }

    /// Enriches a record from a search result.
    ///
    /// Stored records are enriched from their stored copy. Records the store
    /// does not know are skipped unless `enrich_unlisted` is set.
    pub async fn extract(
        &self,
        record: &BusinessRecord,
        stop: &Stop,
    ) -> anyhow::Result<Option<BusinessRecord>> {
        if self.store.get(record.id).is_some() || !self.enrich_unlisted {
            return self.extract_business_data(record.id, stop).await;
        }
        pause(self.latency_ms, stop).await?;
        log::info!("Extracting data for unlisted business: {}", record.name);
        self.enrich_record(record, stop).await.map(Some)
    }

    /// Crawls the record's website, discovering one first if needed, and
    /// returns a new record with the crawled fields merged in.
    pub async fn enrich_record(
        &self,
        record: &BusinessRecord,
        stop: &Stop,
    ) -> anyhow::Result<BusinessRecord> {
        let mut enriched = record.clone();

        if enriched.url.is_none() {
            enriched.url = self.discover_website(record, stop).await?;
        }

        if let Some(url) = enriched.url.clone() {
            match guarded(self.crawler.crawl(&url), stop).await? {
                Ok(crawled) if crawled.is_empty() => {
                    log::debug!("Nothing found on {url}");
                }
                Ok(crawled) => enriched = enriched.merged(&crawled),
                Err(e) => log::warn!("Couldn't crawl {url} got: {e}"),
            }
        }

        if enriched.owner.as_deref().map_or(false, is_company_owner) {
            log::warn!("Dropping company owner for business: {}", enriched.name);
            enriched.owner = None;
        }

        Ok(enriched)
    }

    async fn discover_website(
        &self,
        record: &BusinessRecord,
        stop: &Stop,
    ) -> anyhow::Result<Option<String>> {
        let search = self
            .finder
            .find_websites(&record.name, record.postal_code.as_deref());
        match guarded(search, stop).await? {
            Ok(urls) => Ok(urls.into_iter().next()),
            Err(e) => {
                log::warn!("Website search failed for {} got: {e}", record.name);
                Ok(None)
            }
        }
    }
}
