use std::cmp;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvesterConfig {
    #[serde(default = "default_min_results")]
    pub min_results: usize,

    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,

    #[serde(default)]
    pub latency: Latency,

    #[serde(default)]
    pub pacing: Pacing,

    #[serde(default = "default_enrich_unlisted")]
    pub enrich_unlisted: bool,

    #[serde(default = "default_directory_seed")]
    pub directory_seed: Option<u64>,

    #[serde(default = "default_handle_sigint")]
    pub handle_sigint: bool,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            min_results: default_min_results(),
            lookup_concurrency: default_lookup_concurrency(),
            latency: Latency::default(),
            pacing: Pacing::default(),
            enrich_unlisted: default_enrich_unlisted(),
            directory_seed: default_directory_seed(),
            handle_sigint: default_handle_sigint(),
        }
    }
}

impl HarvesterConfig {
    /// No simulated latency and no pacing delay
    pub fn instant() -> Self {
        Self {
            latency: Latency::none(),
            pacing: Pacing::Sequential { delay_ms: 0 },
            ..Self::default()
        }
    }
}

fn default_min_results() -> usize {
    3
}

fn default_lookup_concurrency() -> usize {
    1
}

fn default_enrich_unlisted() -> bool {
    false
}

fn default_directory_seed() -> Option<u64> {
    None
}

fn default_handle_sigint() -> bool {
    true
}

/// Simulated round-trip times, in milliseconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Latency {
    #[serde(default = "default_resolve_ms")]
    pub resolve_ms: u64,
    #[serde(default = "default_lookup_ms")]
    pub lookup_ms: u64,
    #[serde(default = "default_enrich_ms")]
    pub enrich_ms: u64,
    #[serde(default = "default_directory_ms")]
    pub directory_ms: u64,
    #[serde(default = "default_website_search_ms")]
    pub website_search_ms: u64,
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            resolve_ms: default_resolve_ms(),
            lookup_ms: default_lookup_ms(),
            enrich_ms: default_enrich_ms(),
            directory_ms: default_directory_ms(),
            website_search_ms: default_website_search_ms(),
        }
    }
}

impl Latency {
    pub fn none() -> Self {
        Self {
            resolve_ms: 0,
            lookup_ms: 0,
            enrich_ms: 0,
            directory_ms: 0,
            website_search_ms: 0,
        }
    }
}

fn default_resolve_ms() -> u64 {
    800
}

fn default_lookup_ms() -> u64 {
    500
}

fn default_enrich_ms() -> u64 {
    1000
}

fn default_directory_ms() -> u64 {
    2000
}

fn default_website_search_ms() -> u64 {
    1000
}

/// How an enrichment run schedules its items
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Pacing {
    /// One item at a time with a pause in milliseconds between items
    Sequential {
        #[serde(rename = "delayMs")]
        delay_ms: u64,
    },
    /// The maximum number of concurrent enrichments
    Concurrent(NonZeroUsize),
    /// The number of enrichments started per second
    PerSecond(NonZeroUsize),
}

impl Default for Pacing {
    fn default() -> Self {
        Self::Sequential { delay_ms: 800 }
    }
}

impl Pacing {
    /// Concurrent pacing sized to the machine
    pub fn concurrent_per_cpu() -> Self {
        let n = cmp::max(1, num_cpus::get().saturating_sub(2));
        match NonZeroUsize::new(n) {
            Some(n) => Self::Concurrent(n),
            None => Self::default(),
        }
    }
}
