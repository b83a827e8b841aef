use async_trait::async_trait;

use crate::model::{BusinessRecord, CategoryFilter, PartialRecord};

/// Fetches contact details from a business website
#[async_trait]
pub trait Crawl: Send + Sync {
    async fn crawl(&self, url: &str) -> anyhow::Result<PartialRecord>;
}

/// Best-effort source of additional businesses for a location
#[async_trait]
pub trait Directory: Send + Sync {
    async fn search_directory(
        &self,
        location: &str,
        category: CategoryFilter,
    ) -> anyhow::Result<Vec<BusinessRecord>>;
}

/// Discovers candidate website URLs for a business without one
#[async_trait]
pub trait WebsiteFinder: Send + Sync {
    async fn find_websites(
        &self,
        name: &str,
        postal_code: Option<&str>,
    ) -> anyhow::Result<Vec<String>>;
}
