use std::collections::HashSet;

use harvester_core::{postal_codes_for, resolve_postal_codes, stop_pair, Stop};

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}

#[test]
fn five_digits_resolve_to_themselves() {
    for location in ["10115", "47051", "99999", "01067", "00000"] {
        assert_eq!(codes(&[location]), postal_codes_for(location));
    }
}

#[test]
fn known_prefixes_expand_to_table() {
    assert_eq!(codes(&["10115", "10117", "10119"]), postal_codes_for("10"));
    assert_eq!(codes(&["47051", "47119", "47198"]), postal_codes_for("47"));
    assert_eq!(codes(&["01067", "01069", "01097"]), postal_codes_for("01"));
}

#[test]
fn unknown_prefixes_get_synthetic_codes() {
    assert_eq!(codes(&["40001", "40002", "40003"]), postal_codes_for("4"));
    assert_eq!(codes(&["12301", "12302", "12303"]), postal_codes_for("123"));
    assert_eq!(codes(&["98761", "98762", "98763"]), postal_codes_for("9876"));
}

#[test]
fn too_long_numbers_use_defaults() {
    assert_eq!(postal_codes_for("Atlantis"), postal_codes_for("1234567"));
}

#[test]
fn city_names_match_case_insensitively() {
    let berlin = codes(&["10115", "10117", "10785", "10969"]);
    assert_eq!(berlin, postal_codes_for("Berlin"));
    assert_eq!(berlin, postal_codes_for("BERLIN"));
    assert_eq!(berlin, postal_codes_for("berlin-mitte"));
    assert_eq!(berlin, postal_codes_for("  Berlin  "));

    let duisburg = codes(&["47051", "47119", "47198"]);
    assert_eq!(duisburg, postal_codes_for("Duisburg"));

    assert_eq!(postal_codes_for("München"), postal_codes_for("munich"));
    assert_eq!(postal_codes_for("Köln"), postal_codes_for("Cologne"));
}

#[test]
fn unknown_locations_fall_back_to_defaults() {
    let defaults = postal_codes_for("Atlantis");
    assert!(!defaults.is_empty());
    assert_eq!(defaults, postal_codes_for("nowhere at all"));
}

#[test]
fn results_are_never_empty_and_unique() {
    for location in ["Berlin", "10", "47", "5", "Hamburg", "x", "1234567", "60311"] {
        let resolved = postal_codes_for(location);
        assert!(!resolved.is_empty(), "{location}");
        let unique: HashSet<_> = resolved.iter().collect();
        assert_eq!(unique.len(), resolved.len(), "{location}");
    }
}

#[tokio::test]
async fn resolve_suspends_then_answers() {
    let resolved = resolve_postal_codes("47", 0, &Stop::never()).await.unwrap();
    assert_eq!(codes(&["47051", "47119", "47198"]), resolved);
}

#[tokio::test]
async fn resolve_honours_stop() {
    let (handle, stop) = stop_pair();
    handle.stop();
    let err = resolve_postal_codes("Berlin", 0, &stop).await.unwrap_err();
    assert!(harvester_core::is_cancelled(&err));
}
