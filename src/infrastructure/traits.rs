//! I/O boundary traits for testability
//!
//! These traits abstract the external sources and the cache store, allowing
//! services to be tested with in-memory implementations.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use crate::domain::{BaselineSnapshot, FacetCache, ScoreQuery, ScoreRow};

/// Header row plus data rows of a tabular source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Index of a column by header name (case-insensitive, trimmed).
    pub fn column(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Partner roster.
pub trait RosterSource: Send + Sync {
    fn load(&self) -> io::Result<Table>;
}

/// Per-profile competency scores.
pub trait ScoreSource: Send + Sync {
    /// Fetch rows matching the query, at most `query.limit` of them.
    fn fetch(&self, query: &ScoreQuery) -> io::Result<Vec<ScoreRow>>;
}

/// Frozen baseline snapshot.
pub trait BaselineStore: Send + Sync {
    /// `None` when no baseline is configured or present.
    fn load(&self) -> io::Result<Option<BaselineSnapshot>>;

    /// Replace the baseline with a new snapshot.
    fn save(&self, snapshot: &BaselineSnapshot) -> io::Result<()>;
}

/// Partner display name → dashboard url.
pub trait LinkTable: Send + Sync {
    fn load(&self) -> io::Result<BTreeMap<String, String>>;
}

/// Materialized facet cache.
pub trait CacheStore: Send + Sync {
    /// `None` when no cache has been built yet.
    fn load(&self) -> io::Result<Option<FacetCache>>;

    /// Replace the whole cache. Readers see the old or the new cache, never a mix.
    fn replace(&self, cache: &FacetCache) -> io::Result<()>;

    /// Human readable location, for messages.
    fn location(&self) -> String;
}

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Write via a temporary file in the same directory and rename it into place.
    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        self.ensure_parent(path)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
