//! In-memory sources and stores
//!
//! Used by tests and by callers embedding the refresh pipeline without files.

use std::collections::BTreeMap;
use std::io;
use std::sync::Mutex;

use crate::domain::{BaselineSnapshot, FacetCache, ScoreQuery, ScoreRow};
use crate::infrastructure::traits::{
    BaselineStore, CacheStore, LinkTable, RosterSource, ScoreSource, Table,
};

fn poisoned() -> io::Error {
    io::Error::other("lock poisoned")
}

/// Roster held in memory; `None` behaves like an unreadable source.
#[derive(Debug, Default)]
pub struct MemoryRoster {
    table: Option<Table>,
}

impl MemoryRoster {
    pub fn new(table: Table) -> Self {
        Self { table: Some(table) }
    }

    pub fn unavailable() -> Self {
        Self { table: None }
    }

    /// Roster from a header row and string rows.
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(Table::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        ))
    }
}

impl RosterSource for MemoryRoster {
    fn load(&self) -> io::Result<Table> {
        self.table
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "roster unavailable"))
    }
}

/// Score rows held in memory, filtered like a real source.
#[derive(Debug, Default)]
pub struct MemoryScores {
    rows: Vec<ScoreRow>,
}

impl MemoryScores {
    pub fn new(rows: Vec<ScoreRow>) -> Self {
        Self { rows }
    }
}

impl ScoreSource for MemoryScores {
    fn fetch(&self, query: &ScoreQuery) -> io::Result<Vec<ScoreRow>> {
        Ok(self
            .rows
            .iter()
            .filter(|row| query.accepts(row))
            .take(query.limit)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryBaseline {
    snapshot: Mutex<Option<BaselineSnapshot>>,
}

impl MemoryBaseline {
    pub fn new(snapshot: Option<BaselineSnapshot>) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }
}

impl BaselineStore for MemoryBaseline {
    fn load(&self) -> io::Result<Option<BaselineSnapshot>> {
        Ok(self.snapshot.lock().map_err(|_| poisoned())?.clone())
    }

    fn save(&self, snapshot: &BaselineSnapshot) -> io::Result<()> {
        *self.snapshot.lock().map_err(|_| poisoned())? = Some(snapshot.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryLinks {
    links: BTreeMap<String, String>,
}

impl MemoryLinks {
    pub fn new(links: BTreeMap<String, String>) -> Self {
        Self { links }
    }
}

impl LinkTable for MemoryLinks {
    fn load(&self) -> io::Result<BTreeMap<String, String>> {
        Ok(self.links.clone())
    }
}

/// Facet cache held in memory.
#[derive(Debug, Default)]
pub struct MemoryCache {
    cache: Mutex<Option<FacetCache>>,
}

impl MemoryCache {
    pub fn new(cache: Option<FacetCache>) -> Self {
        Self {
            cache: Mutex::new(cache),
        }
    }
}

impl CacheStore for MemoryCache {
    fn load(&self) -> io::Result<Option<FacetCache>> {
        Ok(self.cache.lock().map_err(|_| poisoned())?.clone())
    }

    fn replace(&self, cache: &FacetCache) -> io::Result<()> {
        *self.cache.lock().map_err(|_| poisoned())? = Some(cache.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
