use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlApiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Seconds before a crawl request is abandoned
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for CrawlApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

impl CrawlApiConfig {
    /// True once an API key is set, blank keys don't count
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .map_or(false, |key| !key.trim().is_empty())
    }
}

fn default_endpoint() -> String {
    String::from("https://api.firecrawl.dev")
}

fn default_user_agent() -> String {
    String::from("Harvesterbot")
}

fn default_timeout() -> u64 {
    30
}
