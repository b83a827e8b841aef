mod capability;
mod config;
mod enrich;
mod fixtures;
mod limiter;
mod lookup;
mod model;
mod pipeline;
mod resolver;
mod search;
mod signal;
mod synthetic;
mod view;

pub use capability::{Crawl, Directory, WebsiteFinder};
pub use config::{HarvesterConfig, Latency, Pacing};
pub use enrich::{is_company_owner, Enricher};
pub use fixtures::FixtureStore;
pub use limiter::{RateLimited, RateLimitedExt, RateLimiter};
pub use lookup::BusinessLookup;
pub use model::{
    BusinessId, BusinessRecord, Category, CategoryFilter, PartialRecord, PostalCodeGroup,
    SearchQuery, SearchResults,
};
pub use pipeline::{enrich_all, EnrichmentReport, Progress, ProgressTx};
pub use resolver::{postal_codes_for, resolve_postal_codes};
pub use search::Harvester;
pub use signal::{guarded, is_cancelled, pause, stop_pair, Cancelled, Stop, StopHandle};
pub use synthetic::{slug, FixtureCrawler, SlugWebsiteFinder, SyntheticDirectory};
pub use view::{sort_records, ExtractedSet, ResultFilter, SortDirection, SortField};

pub use anyhow;
