//! Tests for ScoreIngestion
//!
//! - domain matches take precedence over name matches
//! - unmatched roster entries become placeholder partners
//! - rows beyond the row cap are dropped and flagged
//! - only allow-listed countries are kept

use std::sync::Arc;

use tiermatrix::application::services::{DirectoryLoader, ScoreIngestion};
use tiermatrix::config::Settings;
use tiermatrix::domain::{RosterEntry, ScoreRow};
use tiermatrix::infrastructure::memory::{MemoryRoster, MemoryScores};
use tiermatrix::util::testing;

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

fn entries(rows: &[&[&str]]) -> Vec<RosterEntry> {
    let roster = MemoryRoster::from_rows(&["Partner Name", "Domain", "Brazil"], rows);
    DirectoryLoader::new(Arc::new(roster), Arc::new(Settings::default()))
        .load()
        .unwrap()
        .entries
}

fn score(partner: &str, name: &str, domains: &[&str], profile: &str, country: &str) -> ScoreRow {
    ScoreRow {
        partner_id: partner.to_string(),
        partner_name: name.to_string(),
        partner_domains: domains.iter().map(|d| d.to_string()).collect(),
        profile_id: profile.to_string(),
        country: country.to_string(),
        product: Some("Looker".to_string()),
        score: Some(40.0),
    }
}

fn ingestion(rows: Vec<ScoreRow>, settings: Settings) -> ScoreIngestion {
    ScoreIngestion::new(Arc::new(MemoryScores::new(rows)), Arc::new(settings))
}

#[test]
fn given_domain_and_name_candidates_when_ingesting_then_domain_match_wins() {
    // Arrange: "Acme" by name would hit the first entry, the domain hits the second
    let roster = entries(&[
        &["Acme", "acme.com", "0"],
        &["Acme Brasil", "acme.com.br", "1"],
    ]);
    let rows = vec![
        score("p1", "Acme", &["acme.com.br"], "u1", "Brazil"),
        score("p2", "acme", &[], "u2", "Chile"),
    ];

    // Act
    let result = ingestion(rows, Settings::default()).ingest(&roster).unwrap();

    // Assert
    let p1 = result.partners.iter().find(|p| p.id == "p1").unwrap();
    assert!(p1.managed);
    assert!(p1.regions.is_member("Brazil"));
    let p2 = result.partners.iter().find(|p| p.id == "p2").unwrap();
    assert!(p2.managed, "name fallback applies when no domain matches");
    assert!(!p2.regions.is_member("Brazil"));
    assert_eq!(result.placeholders, 0);
}

#[test]
fn given_unmatched_domain_when_ingesting_then_name_fallback_matches() {
    // Arrange: the source domain is unknown to the roster, the name is not
    let roster = entries(&[&["Acme Brasil", "acme.com.br", "1"]]);
    let rows = vec![score("p1", " ACME brasil ", &["acme-latam.io"], "u1", "Brazil")];

    // Act
    let result = ingestion(rows, Settings::default()).ingest(&roster).unwrap();

    // Assert
    assert_eq!(result.partners.len(), 1);
    let p1 = &result.partners[0];
    assert_eq!(p1.id, "p1");
    assert!(p1.managed);
    assert!(!p1.placeholder);
    assert!(p1.regions.is_member("Brazil"));
    assert!(p1.domains.contains("acme-latam.io"));
    assert!(p1.domains.contains("acme.com.br"));
    assert_eq!(result.placeholders, 0);
    assert_eq!(result.scores.len(), 1);
}

#[test]
fn given_roster_entry_without_scores_when_ingesting_then_placeholder_partner() {
    let roster = entries(&[&["Acme", "acme.com", "0"], &["Nova Labs", "nova.io", "1"]]);
    let rows = vec![score("p1", "Acme", &["acme.com"], "u1", "Chile")];

    let result = ingestion(rows, Settings::default()).ingest(&roster).unwrap();

    assert_eq!(result.placeholders, 1);
    let nova = result
        .partners
        .iter()
        .find(|p| p.placeholder)
        .expect("placeholder");
    assert_eq!(nova.id, "MISSING_BQ_Nova_Labs");
    assert_eq!(nova.name, "Nova Labs");
    assert!(nova.managed);
    assert!(nova.regions.is_member("Brazil"));
}

#[test]
fn given_more_rows_than_cap_when_ingesting_then_truncated() {
    let roster = entries(&[&["Acme", "acme.com", "0"]]);
    let rows = (0..5)
        .map(|i| score("p1", "Acme", &["acme.com"], &format!("u{i}"), "Chile"))
        .collect();
    let mut settings = Settings::default();
    settings.ingestion.row_cap = 3;

    let result = ingestion(rows, settings).ingest(&roster).unwrap();

    assert!(result.truncated);
    assert_eq!(result.rows_ingested, 3);
    assert_eq!(result.scores.len(), 3);
}

#[test]
fn given_rows_outside_geography_when_ingesting_then_dropped() {
    let roster = entries(&[&["Acme", "acme.com", "0"]]);
    let rows = vec![
        score("p1", "Acme", &["acme.com"], "u1", "Chile"),
        score("p1", "Acme", &["acme.com"], "u2", "Spain"),
    ];

    let result = ingestion(rows, Settings::default()).ingest(&roster).unwrap();

    assert!(!result.truncated);
    assert_eq!(result.scores.len(), 1);
    assert_eq!(result.scores[0].country, "Chile");
}

#[test]
fn given_unmatched_source_partner_when_unmanaged_included_then_kept_unmanaged() {
    let roster = entries(&[&["Acme", "acme.com", "0"]]);
    let rows = vec![
        score("p1", "Acme", &["acme.com"], "u1", "Chile"),
        score("p7", "Stranger", &["stranger.net"], "u7", "Peru"),
    ];
    let mut settings = Settings::default();
    settings.ingestion.include_unmanaged = true;

    let result = ingestion(rows, settings).ingest(&roster).unwrap();

    let stranger = result.partners.iter().find(|p| p.id == "p7").unwrap();
    assert!(!stranger.managed);
    assert_eq!(stranger.name, "Stranger");
}
