use std::collections::HashSet;
use std::sync::Arc;

use futures::{stream, StreamExt, TryStreamExt};

use crate::capability::{Crawl, Directory, WebsiteFinder};
use crate::config::HarvesterConfig;
use crate::enrich::Enricher;
use crate::fixtures::FixtureStore;
use crate::lookup::BusinessLookup;
use crate::model::{BusinessId, BusinessRecord, PostalCodeGroup, SearchQuery, SearchResults};
use crate::pipeline::{enrich_all, EnrichmentReport, ProgressTx};
use crate::resolver::resolve_postal_codes;
use crate::signal::Stop;
use crate::synthetic::{FixtureCrawler, SlugWebsiteFinder, SyntheticDirectory};

/// Search, enrichment and pacing wired around one fixture store
pub struct Harvester {
    config: HarvesterConfig,
    lookup: BusinessLookup,
    enricher: Enricher,
}

impl Harvester {
    pub fn new(
        config: HarvesterConfig,
        store: Arc<FixtureStore>,
        crawler: Arc<dyn Crawl>,
        directory: Arc<dyn Directory>,
        finder: Arc<dyn WebsiteFinder>,
    ) -> Self {
        let lookup = BusinessLookup::new(store.clone(), directory, &config);
        let enricher = Enricher::new(store, crawler, finder, &config);
        Self {
            config,
            lookup,
            enricher,
        }
    }

    /// Shared sample store with the synthetic directory, website finder and
    /// fixture crawler.
    pub fn with_defaults(config: HarvesterConfig) -> Self {
        let store = FixtureStore::shared();
        let crawler = Arc::new(FixtureCrawler::new(store.clone()));
        Self::with_crawler(config, crawler)
    }

    /// Like [`Harvester::with_defaults`] but crawling through `crawler`.
    pub fn with_crawler(config: HarvesterConfig, crawler: Arc<dyn Crawl>) -> Self {
        let directory = Arc::new(SyntheticDirectory::new(
            config.directory_seed,
            config.latency.directory_ms,
        ));
        let finder = Arc::new(SlugWebsiteFinder::new(config.latency.website_search_ms));
        Self::new(config, FixtureStore::shared(), crawler, directory, finder)
    }

    pub fn config(&self) -> &HarvesterConfig {
        &self.config
    }

    pub fn lookup(&self) -> &BusinessLookup {
        &self.lookup
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    /// Resolves the query's location and looks up every postal code.
    ///
    /// Groups and the flat list follow postal code resolution order, also
    /// when lookups run concurrently. Only fails when stopped.
    pub async fn search(&self, query: &SearchQuery, stop: &Stop) -> anyhow::Result<SearchResults> {
        let codes =
            resolve_postal_codes(query.location(), self.config.latency.resolve_ms, stop).await?;
        let filter = query.category();
        let lookup = &self.lookup;

        let per_code: Vec<(String, Vec<BusinessRecord>)> = if self.config.lookup_concurrency > 1 {
            stream::iter(codes)
                .map(move |code| async move {
                    let records = lookup.lookup(&code, filter, stop).await?;
                    Ok::<_, anyhow::Error>((code, records))
                })
                .buffered(self.config.lookup_concurrency)
                .try_collect()
                .await?
        } else {
            let mut per_code = Vec::with_capacity(codes.len());
            for code in codes {
                let records = lookup.lookup(&code, filter, stop).await?;
                per_code.push((code, records));
            }
            per_code
        };

        let mut seen: HashSet<BusinessId> = HashSet::new();
        let groups = per_code
            .into_iter()
            .map(|(postal_code, records)| PostalCodeGroup {
                postal_code,
                businesses: records.into_iter().filter(|r| seen.insert(r.id)).collect(),
            })
            .collect();

        let results = SearchResults::from_groups(groups);
        log::info!(
            "Found {} businesses for {:?} in {} postal codes",
            results.total_count,
            query.location(),
            results.postal_code_breakdown.len()
        );
        Ok(results)
    }

    pub async fn extract_business_data(
        &self,
        id: BusinessId,
        stop: &Stop,
    ) -> anyhow::Result<Option<BusinessRecord>> {
        self.enricher.extract_business_data(id, stop).await
    }

    /// Enriches `records` with the configured pacing.
    pub async fn enrich_all(
        &self,
        records: &[BusinessRecord],
        stop: &Stop,
        progress: &ProgressTx,
    ) -> anyhow::Result<EnrichmentReport> {
        enrich_all(&self.enricher, records, self.config.pacing, stop, progress).await
    }
}
