use std::collections::HashSet;

use panel_core::{VisitedCache, MAX_VISITED};

#[test]
fn record_visit_reports_prior_membership() {
    let mut cache = VisitedCache::new();

    assert!(!cache.record_visit("https://a.example"));
    assert!(cache.record_visit("https://a.example"));
    assert_eq!(cache.len(), 1);
}

#[test]
fn size_never_exceeds_capacity_and_eviction_is_fifo() {
    let mut cache = VisitedCache::with_capacity(3);

    cache.record_visit("u1");
    cache.record_visit("u2");
    cache.record_visit("u3");
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.oldest(), Some("u1"));

    // At capacity: the oldest insertion goes first.
    cache.record_visit("u4");
    assert_eq!(cache.len(), 3);
    assert!(!cache.has("u1"));
    assert_eq!(cache.oldest(), Some("u2"));

    cache.record_visit("u5");
    assert!(!cache.has("u2"));
    assert_eq!(cache.oldest(), Some("u3"));
}

#[test]
fn revisiting_does_not_refresh_recency() {
    let mut cache = VisitedCache::with_capacity(2);

    cache.record_visit("u1");
    cache.record_visit("u2");
    // Revisit the oldest entry; FIFO order must not change.
    assert!(cache.record_visit("u1"));
    cache.record_visit("u3");

    // u1 was still the oldest insertion, so it is the one evicted.
    assert!(!cache.has("u1"));
    assert!(cache.has("u2"));
    assert!(cache.has("u3"));
}

#[test]
fn default_capacity_bounds_arbitrary_sequences() {
    let mut cache = VisitedCache::new();

    for i in 0..500 {
        cache.record_visit(&format!("https://example.com/{i}"));
        assert!(cache.len() <= MAX_VISITED);
    }
    assert_eq!(cache.len(), MAX_VISITED);
    // The next eviction candidate is the first still-present insertion.
    assert_eq!(cache.oldest(), Some("https://example.com/400"));
}

#[test]
fn evict_closed_tabs_keeps_only_open_urls_in_order() {
    let mut cache = VisitedCache::with_capacity(4);

    cache.record_visit("u1");
    cache.record_visit("u2");
    cache.record_visit("u3");

    let open: HashSet<String> = ["u1", "u3"].iter().map(ToString::to_string).collect();
    cache.evict_closed_tabs(&open);

    assert_eq!(cache.len(), 2);
    assert!(!cache.has("u2"));
    // Survivors keep their FIFO positions.
    assert_eq!(cache.oldest(), Some("u1"));
    cache.record_visit("u4");
    cache.record_visit("u5");
    cache.record_visit("u6");
    assert!(!cache.has("u1"));
}

#[test]
fn clear_empties_the_cache() {
    let mut cache = VisitedCache::new();
    cache.record_visit("u1");
    cache.record_visit("u2");

    cache.clear();

    assert!(cache.is_empty());
    assert!(!cache.has("u1"));
    assert!(!cache.record_visit("u1"));
}
