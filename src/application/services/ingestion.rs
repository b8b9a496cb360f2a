//! Raw score ingestion
//!
//! Fetches per-profile scores for the roster and resolves every score-source
//! partner against the roster entries: by domain first, by name otherwise.
//! Roster entries without any match survive as placeholder partners.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::error::SourceKind;
use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::normalize::{name_key, normalize_domain, normalize_name, placeholder_id};
use crate::domain::{Partner, ProfileScore, RosterEntry, ScoreQuery, ScoreRow};
use crate::infrastructure::traits::ScoreSource;

/// Output of one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestionResult {
    /// Resolved partners, ordered by id
    pub partners: Vec<Partner>,
    pub scores: Vec<ProfileScore>,
    /// Rows kept after the row cap
    pub rows_ingested: usize,
    /// Rows beyond the cap were dropped
    pub truncated: bool,
    pub placeholders: usize,
}

/// Score-source partner collected from its rows.
#[derive(Default)]
struct SourcePartner {
    name: String,
    domains: BTreeSet<String>,
}

/// Service ingesting raw scores.
pub struct ScoreIngestion {
    scores: Arc<dyn ScoreSource>,
    settings: Arc<Settings>,
}

impl ScoreIngestion {
    pub fn new(scores: Arc<dyn ScoreSource>, settings: Arc<Settings>) -> Self {
        Self { scores, settings }
    }

    /// Query the score source for the given roster entries.
    pub fn query_for(&self, entries: &[RosterEntry]) -> ScoreQuery {
        ScoreQuery {
            domains: entries.iter().map(|e| e.domain.clone()).collect(),
            names: entries.iter().map(|e| name_key(&e.name)).collect(),
            countries: self.settings.geography(),
            limit: self.settings.ingestion.row_cap.saturating_add(1),
            unfiltered: self.settings.ingestion.include_unmanaged,
        }
    }

    /// Fetch scores and resolve partners.
    ///
    /// Only a failing source is an error. Rows beyond the row cap are dropped
    /// with a warning, an empty result is valid.
    pub fn ingest(&self, entries: &[RosterEntry]) -> ApplicationResult<IngestionResult> {
        let query = self.query_for(entries);
        debug!(
            "ingest: {} domains, {} names, limit {}",
            query.domains.len(),
            query.names.len(),
            query.limit
        );

        let mut rows = self.scores.fetch(&query).or_missing(SourceKind::Scores)?;

        let cap = self.settings.ingestion.row_cap;
        let truncated = rows.len() > cap;
        if truncated {
            warn!(
                "ingest: score source returned more than {} rows, extra rows dropped",
                cap
            );
            rows.truncate(cap);
        }
        let rows_ingested = rows.len();

        // country allow-list is enforced here as well, sources may ignore it
        rows.retain(|r| query.countries.contains(&r.country));

        let mut source_partners: BTreeMap<String, SourcePartner> = BTreeMap::new();
        for row in &rows {
            let partner = source_partners.entry(row.partner_id.clone()).or_default();
            if partner.name.is_empty() {
                partner.name = normalize_name(&row.partner_name);
            }
            partner
                .domains
                .extend(row.partner_domains.iter().filter_map(|d| normalize_domain(d)));
        }

        let by_domain = index(entries, |e| e.domain.clone());
        let by_name = index(entries, |e| name_key(&e.name));
        let mut matched = vec![false; entries.len()];
        let mut partners: BTreeMap<String, Partner> = BTreeMap::new();

        for (id, source) in &source_partners {
            let domain_hits: BTreeSet<usize> = source
                .domains
                .iter()
                .filter_map(|d| by_domain.get(d))
                .flatten()
                .copied()
                .collect();
            let hits = if domain_hits.is_empty() {
                by_name
                    .get(&name_key(&source.name))
                    .map(|idx| idx.iter().copied().collect())
                    .unwrap_or_default()
            } else {
                domain_hits
            };

            if hits.is_empty() && !self.settings.ingestion.include_unmanaged {
                continue;
            }

            let mut partner = Partner {
                id: id.clone(),
                name: source.name.clone(),
                domains: source.domains.clone(),
                ..Default::default()
            };
            for idx in hits {
                matched[idx] = true;
                partner.absorb(&entries[idx]);
                if partner.name.is_empty() {
                    partner.name = entries[idx].name.clone();
                }
            }
            partners.insert(id.clone(), partner);
        }

        let scores: Vec<ProfileScore> = rows
            .into_iter()
            .filter(|r| partners.contains_key(&r.partner_id))
            .map(to_profile_score)
            .collect();

        let mut placeholders = 0;
        let prefix = &self.settings.ingestion.placeholder_prefix;
        for (entry, _) in entries.iter().zip(&matched).filter(|(_, m)| !**m) {
            let id = placeholder_id(prefix, &entry.name);
            let partner = partners.entry(id.clone()).or_insert_with(|| {
                placeholders += 1;
                Partner {
                    id,
                    name: entry.name.clone(),
                    placeholder: true,
                    ..Default::default()
                }
            });
            partner.absorb(entry);
        }
        if placeholders > 0 {
            info!("ingest: {} roster partners without scores", placeholders);
        }

        info!(
            "ingest: {} partners, {} score rows",
            partners.len(),
            scores.len()
        );
        Ok(IngestionResult {
            partners: partners.into_values().collect(),
            scores,
            rows_ingested,
            truncated,
            placeholders,
        })
    }
}

fn index(
    entries: &[RosterEntry],
    key: impl Fn(&RosterEntry) -> String,
) -> HashMap<String, Vec<usize>> {
    let mut map: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, entry) in entries.iter().enumerate() {
        map.entry(key(entry)).or_default().push(i);
    }
    map
}

fn to_profile_score(row: ScoreRow) -> ProfileScore {
    ProfileScore {
        partner_id: row.partner_id,
        partner_name: normalize_name(&row.partner_name),
        profile_id: row.profile_id,
        country: row.country,
        product: row.product.filter(|p| !p.trim().is_empty()),
        score: row.score,
    }
}
