use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::capability::{Crawl, Directory, WebsiteFinder};
use crate::fixtures::FixtureStore;
use crate::model::{BusinessRecord, Category, CategoryFilter, PartialRecord};

const RESTAURANT_PREFIXES: &[&str] = &["Bella", "Golden", "Royal", "Spice", "Blue", "Green"];
const RESTAURANT_NAMES: &[&str] = &["Trattoria", "Kitchen", "Garden", "Bistro", "Restaurant", "Eatery"];
const HOTEL_PREFIXES: &[&str] = &["Grand", "Royal", "Luxury", "Comfort", "City", "Park"];
const HOTEL_NAMES: &[&str] = &["Hotel", "Suites", "Resort", "Inn", "Palace", "Lodge"];

const CITY_PREFIXES: &[(&str, &[&str])] = &[
    ("berlin", &["10", "12", "13", "14"]),
    ("münchen", &["80", "81", "82"]),
    ("hamburg", &["20", "21", "22"]),
    ("köln", &["50", "51"]),
    ("frankfurt", &["60", "61"]),
    ("duisburg", &["47"]),
    ("dresden", &["01"]),
];

/// Answers crawls from the fixture store, keyed by website URL.
///
/// Deterministic: the same URL always yields the same fields.
#[derive(Debug, Clone)]
pub struct FixtureCrawler {
    store: Arc<FixtureStore>,
}

impl FixtureCrawler {
    pub fn new(store: Arc<FixtureStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Crawl for FixtureCrawler {
    async fn crawl(&self, url: &str) -> anyhow::Result<PartialRecord> {
        let record = self
            .store
            .find_by_url(url)
            .ok_or_else(|| anyhow!("No page content for {url}"))?;
        Ok(PartialRecord {
            email: record.email.clone(),
            phone: record.phone.clone(),
            owner: record.owner.clone(),
        })
    }
}

/// Manufactures plausible directory entries from name and postal code pools
#[derive(Debug)]
pub struct SyntheticDirectory {
    rng: Mutex<StdRng>,
    latency: Duration,
}

impl SyntheticDirectory {
    pub fn new(seed: Option<u64>, latency_ms: u64) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
            latency: Duration::from_millis(latency_ms),
        }
    }

    fn generate(&self, location: &str, filter: CategoryFilter) -> Vec<BusinessRecord> {
        let mut rng = match self.rng.lock() {
            Ok(rng) => rng,
            Err(poisoned) => poisoned.into_inner(),
        };
        let count = rng.gen_range(3..=7);
        (0..count)
            .map(|_| {
                let category = match filter {
                    CategoryFilter::Restaurants => Category::Restaurant,
                    CategoryFilter::Hotels => Category::Hotel,
                    CategoryFilter::Both if rng.gen_bool(0.5) => Category::Restaurant,
                    CategoryFilter::Both => Category::Hotel,
                };
                let name = business_name(&mut *rng, category);
                let url = format!("https://{}.de", slug(&name));
                let postal_code = postal_code_near(&mut *rng, location);
                BusinessRecord::new(name, category)
                    .with_url(url)
                    .with_postal_code(postal_code)
            })
            .collect()
    }
}

#[async_trait]
impl Directory for SyntheticDirectory {
    async fn search_directory(
        &self,
        location: &str,
        category: CategoryFilter,
    ) -> anyhow::Result<Vec<BusinessRecord>> {
        log::debug!("Searching business directories for {category:?} in {location}");
        tokio::time::sleep(self.latency).await;
        Ok(self.generate(location, category))
    }
}

/// Guesses `https://<slug>.de` from the business name
#[derive(Debug, Clone)]
pub struct SlugWebsiteFinder {
    latency: Duration,
}

impl SlugWebsiteFinder {
    pub fn new(latency_ms: u64) -> Self {
        Self {
            latency: Duration::from_millis(latency_ms),
        }
    }
}

#[async_trait]
impl WebsiteFinder for SlugWebsiteFinder {
    async fn find_websites(
        &self,
        name: &str,
        postal_code: Option<&str>,
    ) -> anyhow::Result<Vec<String>> {
        log::debug!(
            "Searching for website of {name} in {}",
            postal_code.unwrap_or("-")
        );
        tokio::time::sleep(self.latency).await;
        let slug = slug(name);
        if slug.is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![format!("https://{slug}.de")])
    }
}

/// Lowercase ASCII words joined by dashes, other characters dropped
pub fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn business_name<R: Rng>(rng: &mut R, category: Category) -> String {
    let (prefixes, names) = match category {
        Category::Restaurant => (RESTAURANT_PREFIXES, RESTAURANT_NAMES),
        Category::Hotel => (HOTEL_PREFIXES, HOTEL_NAMES),
    };
    let prefix = prefixes.choose(rng).copied().unwrap_or_default();
    let name = names.choose(rng).copied().unwrap_or_default();
    format!("{prefix} {name}")
}

fn postal_code_near<R: Rng>(rng: &mut R, location: &str) -> String {
    let location = location.trim().to_lowercase();
    if location.len() == 5 && location.chars().all(|c| c.is_ascii_digit()) {
        return location;
    }
    let prefix = CITY_PREFIXES
        .iter()
        .find(|(city, _)| location.contains(city))
        .and_then(|(_, prefixes)| prefixes.choose(rng))
        .map(|p| p.to_string())
        .unwrap_or_else(|| rng.gen_range(10..100).to_string());
    format!("{prefix}{}", rng.gen_range(100..1000))
}
