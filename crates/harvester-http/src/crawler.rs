use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use harvester_core::{Crawl, PartialRecord};
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};

use crate::config::CrawlApiConfig;

const SCRAPE_PATH: &str = "/v1/scrape";
const PROBE_URL: &str = "https://example.com";

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    owner: Option<String>,
}

/// Reads a crawl API response body.
///
/// An unsuccessful response becomes an error carrying the API's message.
pub fn parse_response(body: &str) -> Result<PartialRecord> {
    let resp: ScrapeResponse = serde_json::from_str(body)?;
    if !resp.success {
        bail!(
            "{}",
            resp.error.as_deref().unwrap_or("Crawl API reported a failure")
        );
    }
    let data = resp.data.unwrap_or_default();
    Ok(PartialRecord {
        email: data.email,
        phone: data.phone,
        owner: data.owner,
    })
}

/// Crawls business websites through a hosted scrape API
#[derive(Debug, Clone)]
pub struct HttpCrawler {
    client: reqwest::Client,
    config: CrawlApiConfig,
}

impl HttpCrawler {
    pub fn new(config: CrawlApiConfig) -> Result<Self> {
        if !config.is_configured() {
            bail!("No crawl API key configured");
        }
        let client = reqwest::ClientBuilder::new()
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn scrape_url(&self) -> String {
        format!("{}{SCRAPE_PATH}", self.config.endpoint.trim_end_matches('/'))
    }

    /// Probes the API with the configured key.
    pub async fn test_api_key(&self) -> bool {
        match self.crawl(PROBE_URL).await {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Crawl API key rejected got: {e}");
                false
            }
        }
    }
}

#[async_trait]
impl Crawl for HttpCrawler {
    async fn crawl(&self, url: &str) -> Result<PartialRecord> {
        log::debug!("Crawling {url}");
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let resp = self
            .client
            .post(self.scrape_url())
            .header(USER_AGENT, &self.config.user_agent)
            .bearer_auth(api_key)
            .json(&ScrapeRequest { url })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        match parse_response(&body) {
            Ok(record) => Ok(record),
            Err(e) if !status.is_success() => Err(anyhow!("{status} for {url}: {e}")),
            Err(e) => Err(e),
        }
    }
}
