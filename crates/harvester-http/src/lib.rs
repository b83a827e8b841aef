mod config;
mod crawler;

pub use config::CrawlApiConfig;
pub use crawler::{parse_response, HttpCrawler};
