//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{
    load_cache, FacetOptions, RefreshService, ViewRenderer,
};
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::FacetCache;
use crate::infrastructure::files::{
    CsvLinkTable, CsvRosterSource, CsvScoreSource, JsonBaselineStore, JsonCacheStore,
};
use crate::infrastructure::traits::{
    BaselineStore, CacheStore, FileSystem, LinkTable, RealFileSystem, RosterSource, ScoreSource,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    pub cache: Arc<dyn CacheStore>,
    pub refresh: RefreshService,
    pub renderer: ViewRenderer,
    pub options: FacetOptions,
}

impl ServiceContainer {
    /// Create a new service container with file-backed sources.
    pub fn new(settings: Settings) -> Self {
        Self::with_fs(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container over a custom filesystem.
    pub fn with_fs(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let roster = Arc::new(CsvRosterSource::new(settings.roster_path(), fs.clone()));
        let scores = Arc::new(CsvScoreSource::new(settings.scores_path(), fs.clone()));
        let baseline = Arc::new(JsonBaselineStore::new(settings.baseline_path(), fs.clone()));
        let links = Arc::new(CsvLinkTable::new(settings.links_path(), fs.clone()));
        let cache = Arc::new(JsonCacheStore::new(settings.cache_file(), fs.clone()));
        Self::with_deps(settings, fs, roster, scores, baseline, links, cache)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        roster: Arc<dyn RosterSource>,
        scores: Arc<dyn ScoreSource>,
        baseline: Arc<dyn BaselineStore>,
        links: Arc<dyn LinkTable>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        let settings = Arc::new(settings);
        let refresh = RefreshService::new(
            settings.clone(),
            roster,
            scores,
            baseline,
            links,
            cache.clone(),
        );

        Self {
            renderer: ViewRenderer::new(settings.clone()),
            options: FacetOptions::new(settings.clone()),
            settings,
            fs,
            cache,
            refresh,
        }
    }

    /// Current facet cache, `CacheMissing` when no refresh has run yet.
    pub fn facet_cache(&self) -> ApplicationResult<FacetCache> {
        load_cache(self.cache.as_ref())
    }
}
