//! Refresh orchestration
//!
//! Runs directory load, score ingestion, aggregation, baseline alignment and
//! cache construction as one logical step. The cache store is only touched
//! after every earlier stage succeeded, so a failed run leaves the previous
//! cache in place.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::application::error::SourceKind;
use crate::application::services::aggregator::PivotAggregator;
use crate::application::services::cache_builder::{load_cache, FacetCacheBuilder};
use crate::application::services::delta::DeltaEngine;
use crate::application::services::directory::DirectoryLoader;
use crate::application::services::ingestion::ScoreIngestion;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{BaselineSnapshot, MatrixSchema};
use crate::infrastructure::traits::{
    BaselineStore, CacheStore, LinkTable, RosterSource, ScoreSource,
};

/// Stage of a refresh run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefreshStage {
    Directory,
    Ingestion,
    Baseline,
    Links,
    Cache,
}

impl fmt::Display for RefreshStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshStage::Directory => "directory",
            RefreshStage::Ingestion => "ingestion",
            RefreshStage::Baseline => "baseline",
            RefreshStage::Links => "links",
            RefreshStage::Cache => "cache",
        };
        f.write_str(name)
    }
}

/// Counts of a completed refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub roster_entries: usize,
    pub discarded: usize,
    pub partners: usize,
    pub managed: usize,
    pub placeholders: usize,
    pub profiles: usize,
    pub rows_ingested: usize,
    pub truncated: bool,
    /// Product name → scored rows that fell outside the catalogue
    pub unknown_products: BTreeMap<String, usize>,
    pub baseline_present: bool,
    pub elapsed_ms: u128,
    /// RFC 3339, UTC
    pub completed_at: String,
}

/// Result of a refresh run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed(RefreshReport),
    /// The run stopped at `stage`; the previous cache is untouched.
    Skipped { stage: RefreshStage, reason: String },
}

impl RefreshOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, RefreshOutcome::Skipped { .. })
    }
}

/// Service rebuilding the facet cache from the external sources.
pub struct RefreshService {
    directory: DirectoryLoader,
    ingestion: ScoreIngestion,
    aggregator: PivotAggregator,
    delta: DeltaEngine,
    builder: FacetCacheBuilder,
    baseline: Arc<dyn BaselineStore>,
    links: Arc<dyn LinkTable>,
    cache: Arc<dyn CacheStore>,
}

type StageResult<T> = Result<T, (RefreshStage, ApplicationError)>;

trait AtStage<T> {
    fn at(self, stage: RefreshStage) -> StageResult<T>;
}

impl<T> AtStage<T> for ApplicationResult<T> {
    fn at(self, stage: RefreshStage) -> StageResult<T> {
        self.map_err(|e| (stage, e))
    }
}

impl RefreshService {
    pub fn new(
        settings: Arc<Settings>,
        roster: Arc<dyn RosterSource>,
        scores: Arc<dyn ScoreSource>,
        baseline: Arc<dyn BaselineStore>,
        links: Arc<dyn LinkTable>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        let schema = MatrixSchema::fixed();
        Self {
            directory: DirectoryLoader::new(roster, settings.clone()),
            ingestion: ScoreIngestion::new(scores, settings),
            aggregator: PivotAggregator::new(schema.clone()),
            delta: DeltaEngine::new(schema.clone()),
            builder: FacetCacheBuilder::new(schema),
            baseline,
            links,
            cache,
        }
    }

    /// Rebuild and swap in the facet cache.
    ///
    /// Never fails: a failing stage is logged and reported as `Skipped`.
    pub fn run(&self) -> RefreshOutcome {
        debug!("run");
        let started = Instant::now();
        match self.execute(started) {
            Ok(report) => {
                info!(
                    "refresh completed: {} partners, {} profiles in {} ms",
                    report.partners, report.profiles, report.elapsed_ms
                );
                RefreshOutcome::Completed(report)
            }
            Err((stage, e)) => {
                error!("refresh skipped at {} stage: {}", stage, e);
                RefreshOutcome::Skipped {
                    stage,
                    reason: e.to_string(),
                }
            }
        }
    }

    fn execute(&self, started: Instant) -> StageResult<RefreshReport> {
        let directory = self.directory.load().at(RefreshStage::Directory)?;
        let ingested = self
            .ingestion
            .ingest(&directory.entries)
            .at(RefreshStage::Ingestion)?;
        let aggregation = self
            .aggregator
            .aggregate(&ingested.partners, &ingested.scores);

        let baseline = self
            .baseline
            .load()
            .or_missing(SourceKind::Baseline)
            .at(RefreshStage::Baseline)?
            .map(|snapshot| self.delta.align(&snapshot));
        if baseline.is_none() {
            warn!("no baseline available, every partner is reported as new");
        }

        let links = self
            .links
            .load()
            .or_missing(SourceKind::Links)
            .at(RefreshStage::Links)?;
        debug!("links: {} entries", links.len());

        let cache = self
            .builder
            .build(&aggregation.records, baseline.as_ref(), &links);
        self.cache
            .replace(&cache)
            .with_context("replace facet cache")
            .at(RefreshStage::Cache)?;
        info!("cache: {} rows written to {}", cache.rows.len(), self.cache.location());

        let partners = &ingested.partners;
        Ok(RefreshReport {
            roster_entries: directory.entries.len(),
            discarded: directory.discarded,
            partners: partners.len(),
            managed: partners.iter().filter(|p| p.managed).count(),
            placeholders: ingested.placeholders,
            profiles: aggregation.profiles,
            rows_ingested: ingested.rows_ingested,
            truncated: ingested.truncated,
            unknown_products: aggregation.unknown_products,
            baseline_present: baseline.is_some(),
            elapsed_ms: started.elapsed().as_millis(),
            completed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }

    /// Freeze the current cache values as the next baseline.
    pub fn freeze_baseline(&self) -> ApplicationResult<BaselineSnapshot> {
        debug!("freeze_baseline");
        let cache = load_cache(self.cache.as_ref())?;
        let snapshot = self.delta.freeze(&cache);
        self.baseline
            .save(&snapshot)
            .with_context("save baseline")?;
        info!("baseline frozen: {} partners", snapshot.rows.len());
        Ok(snapshot)
    }
}
