#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use harvester_core::anyhow::{self, bail};
use harvester_core::{
    BusinessRecord, Category, CategoryFilter, Crawl, Directory, FixtureStore, Harvester,
    HarvesterConfig, PartialRecord, SlugWebsiteFinder, WebsiteFinder,
};

/// Always returns the same records, ids included
pub struct FixedDirectory {
    pub records: Vec<BusinessRecord>,
    pub calls: AtomicUsize,
}

impl FixedDirectory {
    pub fn new(records: Vec<BusinessRecord>) -> Self {
        Self {
            records,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(vec![])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Directory for FixedDirectory {
    async fn search_directory(
        &self,
        _location: &str,
        category: CategoryFilter,
    ) -> anyhow::Result<Vec<BusinessRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .iter()
            .filter(|r| category.matches(r.category))
            .cloned()
            .collect())
    }
}

pub struct FailingDirectory;

#[async_trait]
impl Directory for FailingDirectory {
    async fn search_directory(
        &self,
        location: &str,
        _category: CategoryFilter,
    ) -> anyhow::Result<Vec<BusinessRecord>> {
        bail!("directory unavailable for {location}")
    }
}

/// Returns a fixed partial record and remembers every crawled URL
pub struct ScriptedCrawler {
    pub reply: PartialRecord,
    pub crawled: Mutex<Vec<String>>,
}

impl ScriptedCrawler {
    pub fn new(reply: PartialRecord) -> Self {
        Self {
            reply,
            crawled: Mutex::new(vec![]),
        }
    }

    pub fn crawled(&self) -> Vec<String> {
        self.crawled.lock().unwrap().clone()
    }
}

#[async_trait]
impl Crawl for ScriptedCrawler {
    async fn crawl(&self, url: &str) -> anyhow::Result<PartialRecord> {
        self.crawled.lock().unwrap().push(url.to_string());
        Ok(self.reply.clone())
    }
}

pub struct FailingCrawler;

#[async_trait]
impl Crawl for FailingCrawler {
    async fn crawl(&self, url: &str) -> anyhow::Result<PartialRecord> {
        bail!("connection refused: {url}")
    }
}

pub struct NoWebsiteFinder;

#[async_trait]
impl WebsiteFinder for NoWebsiteFinder {
    async fn find_websites(
        &self,
        _name: &str,
        _postal_code: Option<&str>,
    ) -> anyhow::Result<Vec<String>> {
        Ok(vec![])
    }
}

pub fn record(name: &str, category: Category, postal_code: &str) -> BusinessRecord {
    BusinessRecord::new(name, category).with_postal_code(postal_code)
}

pub fn harvester_with(
    config: HarvesterConfig,
    store: Arc<FixtureStore>,
    crawler: Arc<dyn Crawl>,
    directory: Arc<dyn Directory>,
) -> Harvester {
    Harvester::new(
        config,
        store,
        crawler,
        directory,
        Arc::new(SlugWebsiteFinder::new(0)),
    )
}

/// Sample store, no latency, an empty directory and the given crawler
pub fn sample_harvester(crawler: Arc<dyn Crawl>) -> Harvester {
    harvester_with(
        HarvesterConfig::instant(),
        FixtureStore::shared(),
        crawler,
        Arc::new(FixedDirectory::empty()),
    )
}

pub fn sample_record(name: &str) -> BusinessRecord {
    FixtureStore::shared()
        .iter()
        .find(|r| r.name == name)
        .cloned()
        .unwrap_or_else(|| panic!("no sample record named {name}"))
}
