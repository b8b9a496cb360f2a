//! File-backed sources and stores
//!
//! CSV for tabular inputs, JSON for the baseline and the facet cache. All
//! reads and writes go through the `FileSystem` abstraction.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::tier::parse_score;
use crate::domain::{BaselineSnapshot, FacetCache, ScoreQuery, ScoreRow};
use crate::infrastructure::traits::{
    BaselineStore, CacheStore, FileSystem, LinkTable, RosterSource, ScoreSource, Table,
};

pub const LINK_NAME_COLUMN: &str = "Partner Name";
pub const LINK_URL_COLUMN: &str = "Dashboard URL";

fn csv_reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes())
}

fn read_table(fs: &dyn FileSystem, path: &Path) -> io::Result<Table> {
    let content = fs.read_to_string(path)?;
    let mut reader = csv_reader(&content);
    let headers = reader.headers()?.iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(String::from).collect()))
        .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;
    Ok(Table::new(headers, rows))
}

/// Roster read from a CSV file with a header row.
pub struct CsvRosterSource {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl CsvRosterSource {
    pub fn new(path: PathBuf, fs: Arc<dyn FileSystem>) -> Self {
        Self { path, fs }
    }
}

impl RosterSource for CsvRosterSource {
    fn load(&self) -> io::Result<Table> {
        debug!("roster: {}", self.path.display());
        read_table(self.fs.as_ref(), &self.path)
    }
}

#[derive(Debug, Deserialize)]
struct RawScoreRow {
    partner_id: String,
    #[serde(default)]
    partner_name: String,
    #[serde(default)]
    partner_domains: String,
    profile_id: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    product: Option<String>,
    #[serde(default)]
    score: Option<String>,
}

impl From<RawScoreRow> for ScoreRow {
    fn from(raw: RawScoreRow) -> Self {
        ScoreRow {
            partner_id: raw.partner_id.trim().to_string(),
            partner_name: raw.partner_name.trim().to_string(),
            partner_domains: raw
                .partner_domains
                .split(';')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from)
                .collect(),
            profile_id: raw.profile_id.trim().to_string(),
            country: raw.country.trim().to_string(),
            product: raw
                .product
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            score: raw.score.as_deref().and_then(parse_score),
        }
    }
}

/// Score export read from a CSV file.
///
/// Columns: `partner_id, partner_name, partner_domains, profile_id, country,
/// product, score`; domains are `;`-separated.
pub struct CsvScoreSource {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl CsvScoreSource {
    pub fn new(path: PathBuf, fs: Arc<dyn FileSystem>) -> Self {
        Self { path, fs }
    }
}

impl ScoreSource for CsvScoreSource {
    fn fetch(&self, query: &ScoreQuery) -> io::Result<Vec<ScoreRow>> {
        debug!("scores: {}", self.path.display());
        let content = self.fs.read_to_string(&self.path)?;
        let mut reader = csv_reader(&content);
        let mut rows = Vec::new();
        for raw in reader.deserialize::<RawScoreRow>() {
            if rows.len() >= query.limit {
                break;
            }
            let row = ScoreRow::from(raw?);
            if query.accepts(&row) {
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

/// Baseline snapshot stored as JSON.
///
/// Without a configured path there is no baseline; saving then fails.
pub struct JsonBaselineStore {
    path: Option<PathBuf>,
    fs: Arc<dyn FileSystem>,
}

impl JsonBaselineStore {
    pub fn new(path: Option<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self { path, fs }
    }
}

impl BaselineStore for JsonBaselineStore {
    fn load(&self) -> io::Result<Option<BaselineSnapshot>> {
        let Some(path) = &self.path else {
            debug!("baseline: not configured");
            return Ok(None);
        };
        if !self.fs.exists(path) {
            warn!("baseline: {} not found", path.display());
            return Ok(None);
        }
        let content = self.fs.read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, snapshot: &BaselineSnapshot) -> io::Result<()> {
        let path = self.path.as_ref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "no baseline path configured")
        })?;
        let content = serde_json::to_string_pretty(snapshot)?;
        self.fs.write_atomic(path, &content)
    }
}

/// Partner name to dashboard url table read from CSV.
pub struct CsvLinkTable {
    path: Option<PathBuf>,
    fs: Arc<dyn FileSystem>,
}

impl CsvLinkTable {
    pub fn new(path: Option<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self { path, fs }
    }
}

impl LinkTable for CsvLinkTable {
    fn load(&self) -> io::Result<BTreeMap<String, String>> {
        let Some(path) = &self.path else {
            return Ok(BTreeMap::new());
        };
        if !self.fs.exists(path) {
            warn!("links: {} not found", path.display());
            return Ok(BTreeMap::new());
        }
        let table = read_table(self.fs.as_ref(), path)?;
        let (Some(name), Some(url)) = (
            table.column(LINK_NAME_COLUMN),
            table.column(LINK_URL_COLUMN),
        ) else {
            warn!(
                "schema drift: link table lacks '{}' or '{}', no links applied",
                LINK_NAME_COLUMN, LINK_URL_COLUMN
            );
            return Ok(BTreeMap::new());
        };
        Ok(table
            .rows
            .iter()
            .filter_map(|row| {
                let name = row.get(name)?.trim();
                let url = row.get(url)?.trim();
                (!name.is_empty() && !url.is_empty())
                    .then(|| (name.to_string(), url.to_string()))
            })
            .collect())
    }
}

/// Facet cache stored as one JSON document, replaced atomically.
pub struct JsonCacheStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl JsonCacheStore {
    pub fn new(path: PathBuf, fs: Arc<dyn FileSystem>) -> Self {
        Self { path, fs }
    }
}

impl CacheStore for JsonCacheStore {
    fn load(&self) -> io::Result<Option<FacetCache>> {
        if !self.fs.exists(&self.path) {
            return Ok(None);
        }
        let content = self.fs.read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn replace(&self, cache: &FacetCache) -> io::Result<()> {
        let content = serde_json::to_string_pretty(cache)?;
        self.fs.write_atomic(&self.path, &content)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
