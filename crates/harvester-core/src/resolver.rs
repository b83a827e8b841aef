use std::collections::HashSet;

use crate::signal::{pause, Stop};

const POSTAL_CODE_LEN: usize = 5;

const KNOWN_PREFIXES: &[(&str, &[&str])] = &[
    ("10", &["10115", "10117", "10119"]),
    ("47", &["47051", "47119", "47198"]),
    ("80", &["80331", "80333", "80335"]),
    ("20", &["20095", "20097", "20099"]),
    ("50", &["50667", "50668", "50670"]),
    ("60", &["60311", "60313", "60314"]),
    ("01", &["01067", "01069", "01097"]),
];

const CITIES: &[(&[&str], &[&str])] = &[
    (&["berlin"], &["10115", "10117", "10785", "10969"]),
    (&["duisburg"], &["47051", "47119", "47198"]),
    (&["münchen", "muenchen", "munich"], &["80331", "80333", "80335"]),
    (&["hamburg"], &["20095", "20097", "20099"]),
    (&["köln", "koeln", "cologne"], &["50667", "50668", "50670"]),
    (&["frankfurt"], &["60311", "60313", "60314"]),
    (&["dresden"], &["01067", "01069", "01097"]),
];

const DEFAULT_CODES: &[&str] = &["10115", "10117", "10785", "10969"];

const SYNTHETIC_SUFFIXES: [u32; 3] = [1, 2, 3];

/// Maps a city name or postal code prefix to candidate postal codes.
///
/// Never empty: unknown input falls back to a fixed default set.
pub fn postal_codes_for(location: &str) -> Vec<String> {
    let location = location.trim();
    let codes = if is_numeric(location) {
        numeric_codes(location)
    } else {
        city_codes(location)
    };
    let codes = codes.unwrap_or_else(|| to_owned(DEFAULT_CODES));
    dedup_first_seen(codes)
}

/// Same as [`postal_codes_for`] after one simulated lookup round-trip.
pub async fn resolve_postal_codes(
    location: &str,
    latency_ms: u64,
    stop: &Stop,
) -> anyhow::Result<Vec<String>> {
    pause(latency_ms, stop).await?;
    let codes = postal_codes_for(location);
    log::info!("Resolved {location:?} to postal codes {codes:?}");
    Ok(codes)
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn numeric_codes(prefix: &str) -> Option<Vec<String>> {
    if prefix.len() == POSTAL_CODE_LEN {
        return Some(vec![prefix.to_string()]);
    }
    if prefix.len() > POSTAL_CODE_LEN {
        return None;
    }
    if let Some((_, codes)) = KNOWN_PREFIXES.iter().find(|(p, _)| *p == prefix) {
        return Some(to_owned(codes));
    }
    let width = POSTAL_CODE_LEN - prefix.len();
    Some(
        SYNTHETIC_SUFFIXES
            .iter()
            .map(|suffix| format!("{prefix}{suffix:0width$}"))
            .collect(),
    )
}

fn city_codes(location: &str) -> Option<Vec<String>> {
    let location = location.to_lowercase();
    CITIES
        .iter()
        .find(|(names, _)| names.iter().any(|name| location.contains(name)))
        .map(|(_, codes)| to_owned(codes))
}

fn to_owned(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

fn dedup_first_seen(codes: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    codes
        .into_iter()
        .filter(|c| seen.insert(c.clone()))
        .collect()
}
