//! Tests for RefreshService
//!
//! The pipeline runs over in-memory sources:
//! - a completed run swaps in a new cache
//! - a skipped run leaves the previous cache untouched
//! - identical inputs rebuild an identical cache
//! - a frozen baseline drives the next run's deltas

use std::collections::BTreeMap;
use std::sync::Arc;

use tiermatrix::application::services::{
    FacetOptions, RefreshOutcome, RefreshService, RefreshStage,
};
use tiermatrix::config::Settings;
use tiermatrix::domain::link::plain_text;
use tiermatrix::domain::{Facet, FacetCache, MatrixSchema, ScoreRow, Solution, Tier, Trend};
use tiermatrix::infrastructure::memory::{
    MemoryBaseline, MemoryCache, MemoryLinks, MemoryRoster, MemoryScores,
};
use tiermatrix::infrastructure::traits::{CacheStore, RosterSource};
use tiermatrix::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

const ROSTER_HEADERS: &[&str] = &[
    "Partner Name",
    "Domain",
    "Brazil",
    "Mexico",
    "MCO",
    "GSI",
    "PS",
];

fn score(partner: &str, domain: &str, profile: &str, product: &str, value: f64) -> ScoreRow {
    ScoreRow {
        partner_id: partner.to_string(),
        partner_name: partner.to_uppercase(),
        partner_domains: vec![domain.to_string()],
        profile_id: profile.to_string(),
        country: "Chile".to_string(),
        product: Some(product.to_string()),
        score: Some(value),
    }
}

fn acme_roster() -> MemoryRoster {
    MemoryRoster::from_rows(ROSTER_HEADERS, &[&["Acme", "acme.com", "0", "0", "1", "0", "0"]])
}

struct Pipeline {
    service: RefreshService,
    cache: Arc<MemoryCache>,
    baseline: Arc<MemoryBaseline>,
}

fn pipeline(roster: impl RosterSource + 'static, scores: Vec<ScoreRow>) -> Pipeline {
    let cache = Arc::new(MemoryCache::default());
    let baseline = Arc::new(MemoryBaseline::default());
    let service = RefreshService::new(
        Arc::new(Settings::default()),
        Arc::new(roster),
        Arc::new(MemoryScores::new(scores)),
        baseline.clone(),
        Arc::new(MemoryLinks::new(BTreeMap::new())),
        cache.clone(),
    );
    Pipeline {
        service,
        cache,
        baseline,
    }
}

fn stored(cache: &MemoryCache) -> FacetCache {
    cache.load().unwrap().expect("cache written")
}

// ============================================================
// run() tests
// ============================================================

#[test]
fn given_single_db_score_of_60_when_refreshing_then_tier1_cell_counts_one() {
    // Arrange
    let p = pipeline(
        acme_roster(),
        vec![score("p1", "acme.com", "u1", "Cloud SQL", 60.0)],
    );

    // Act
    let RefreshOutcome::Completed(report) = p.service.run() else {
        panic!("refresh skipped");
    };

    // Assert
    assert_eq!(report.partners, 1);
    assert_eq!(report.managed, 1);
    assert_eq!(report.profiles, 1);
    assert!(!report.baseline_present);

    let cache = stored(&p.cache);
    assert_eq!(cache.rows.len(), 1);
    let row = &cache.rows[0];
    assert_eq!(row.partner_id, "p1");
    assert_eq!(row.total.display(), "1");
    assert!(row.metadata.managed);
    assert!(row.metadata.regions.is_member("MCO"));

    let schema = MatrixSchema::fixed();
    let tier1 = schema.position("Cloud SQL", Tier::Tier1).unwrap();
    assert_eq!(row.cells[tier1].display(), "1");
    for (i, column) in schema.columns().iter().enumerate() {
        if column.solution == Solution::Databases && i != tier1 {
            assert_eq!(row.cells[i].display(), "-", "column {}", column.label());
        }
    }
}

#[test]
fn given_unreadable_roster_when_refreshing_then_skipped_and_previous_cache_kept() {
    // Arrange: a first run fills the cache
    let first = pipeline(
        acme_roster(),
        vec![score("p1", "acme.com", "u1", "Cloud SQL", 60.0)],
    );
    assert!(!first.service.run().is_skipped());
    let previous = stored(&first.cache);

    let cache = first.cache.clone();
    let second = RefreshService::new(
        Arc::new(Settings::default()),
        Arc::new(MemoryRoster::unavailable()),
        Arc::new(MemoryScores::default()),
        Arc::new(MemoryBaseline::default()),
        Arc::new(MemoryLinks::default()),
        cache.clone(),
    );

    // Act
    let outcome = second.run();

    // Assert
    match outcome {
        RefreshOutcome::Skipped { stage, reason } => {
            assert_eq!(stage, RefreshStage::Directory);
            assert!(reason.contains("partner directory"), "reason: {reason}");
        }
        other => panic!("expected skip, got {other:?}"),
    }
    assert_eq!(stored(&cache), previous);
}

#[test]
fn given_empty_roster_when_refreshing_then_skipped_without_cache() {
    let p = pipeline(MemoryRoster::from_rows(ROSTER_HEADERS, &[]), vec![]);

    let outcome = p.service.run();

    assert!(outcome.is_skipped());
    assert!(p.cache.load().unwrap().is_none());
}

#[test]
fn given_same_inputs_when_refreshing_twice_then_identical_cache() {
    // Arrange
    let scores = vec![
        score("p1", "acme.com", "u1", "Cloud SQL", 60.0),
        score("p1", "acme.com", "u2", "BigQuery", 30.0),
        score("p1", "acme.com", "u2", "Unknown Product", 90.0),
    ];
    let p = pipeline(acme_roster(), scores);

    // Act
    p.service.run();
    let first = stored(&p.cache);
    p.service.run();
    let second = stored(&p.cache);

    // Assert
    assert_eq!(first, second);
}

#[test]
fn given_unknown_product_when_refreshing_then_reported_and_profile_still_counted() {
    let p = pipeline(
        acme_roster(),
        vec![score("p1", "acme.com", "u9", "Firebase", 80.0)],
    );

    let RefreshOutcome::Completed(report) = p.service.run() else {
        panic!("refresh skipped");
    };

    assert_eq!(report.unknown_products.get("Firebase"), Some(&1));
    let row = &stored(&p.cache).rows[0];
    assert_eq!(row.metadata.total_profiles, 1);
    assert!(row.cells.iter().all(|c| c.value == 0));
}

#[test]
fn given_roster_partner_without_scores_when_refreshing_then_placeholder_row() {
    let roster = MemoryRoster::from_rows(
        ROSTER_HEADERS,
        &[
            &["Acme", "acme.com", "0", "0", "1", "0", "0"],
            &["Nova Labs", "nova.io", "1", "0", "0", "0", "0"],
        ],
    );
    let p = pipeline(roster, vec![score("p1", "acme.com", "u1", "Cloud SQL", 60.0)]);

    let RefreshOutcome::Completed(report) = p.service.run() else {
        panic!("refresh skipped");
    };

    assert_eq!(report.placeholders, 1);
    let cache = stored(&p.cache);
    let nova = cache
        .rows
        .iter()
        .find(|r| plain_text(&r.name) == "Nova Labs")
        .expect("placeholder row");
    assert_eq!(nova.partner_id, "MISSING_BQ_Nova_Labs");
    assert!(nova.metadata.placeholder);
    assert_eq!(nova.total.display(), "-");
}

#[test]
fn given_roster_country_flags_when_refreshing_then_declared_countries_cached() {
    // Arrange: Nova Labs declares Peru but has no scored profiles
    let roster = MemoryRoster::from_rows(
        &["Partner Name", "Domain", "Brazil", "Mexico", "MCO", "GSI", "PS", "Peru"],
        &[
            &["Acme", "acme.com", "0", "0", "1", "0", "0", "0"],
            &["Nova Labs", "nova.io", "0", "0", "1", "0", "0", "yes"],
        ],
    );
    let p = pipeline(roster, vec![score("p1", "acme.com", "u1", "Cloud SQL", 60.0)]);

    // Act
    assert!(!p.service.run().is_skipped());

    // Assert
    let cache = stored(&p.cache);
    let nova = cache
        .rows
        .iter()
        .find(|r| r.metadata.placeholder)
        .expect("placeholder row");
    assert!(nova.metadata.declared_countries.contains("Peru"));
    assert!(nova.metadata.countries.is_empty());

    let options = FacetOptions::new(Arc::new(Settings::default()));
    assert_eq!(
        options.countries(&cache, &Facet::parse("MCO")),
        vec!["All", "Chile", "Peru"]
    );
}

// ============================================================
// freeze_baseline() tests
// ============================================================

#[test]
fn given_frozen_baseline_when_scores_grow_then_deltas_reported() {
    // Arrange: first run with one profile, then freeze
    let p = pipeline(
        acme_roster(),
        vec![score("p1", "acme.com", "u1", "Cloud SQL", 60.0)],
    );
    p.service.run();
    let snapshot = p.service.freeze_baseline().unwrap();
    assert_eq!(snapshot.rows.len(), 1);

    // second pipeline sharing the baseline, with two more profiles
    let cache = Arc::new(MemoryCache::default());
    let service = RefreshService::new(
        Arc::new(Settings::default()),
        Arc::new(acme_roster()),
        Arc::new(MemoryScores::new(vec![
            score("p1", "acme.com", "u1", "Cloud SQL", 60.0),
            score("p1", "acme.com", "u2", "Cloud SQL", 55.0),
            score("p1", "acme.com", "u3", "Cloud SQL", 10.0),
        ])),
        p.baseline.clone(),
        Arc::new(MemoryLinks::default()),
        cache.clone(),
    );

    // Act
    let RefreshOutcome::Completed(report) = service.run() else {
        panic!("refresh skipped");
    };

    // Assert
    assert!(report.baseline_present);
    let row = &stored(&cache).rows[0];
    assert_eq!(row.total.display(), "3 / (+2)");
    assert_eq!(row.total.trend, Trend::Increase);
    let schema = MatrixSchema::fixed();
    let tier1 = schema.position("Cloud SQL", Tier::Tier1).unwrap();
    let tier4 = schema.position("Cloud SQL", Tier::Tier4).unwrap();
    assert_eq!(row.cells[tier1].display(), "2 / (+1)");
    assert_eq!(row.cells[tier4].display(), "1 / (+1)");
}

#[test]
fn given_no_cache_when_freezing_then_cache_missing() {
    let p = pipeline(acme_roster(), vec![]);

    let result = p.service.freeze_baseline();

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("run `tiermatrix refresh`"));
}
