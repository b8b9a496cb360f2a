//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (RosterSource, ScoreSource, CacheStore, etc.)
//! but are themselves concrete structs, not traits.

pub mod aggregator;
pub mod cache_builder;
pub mod delta;
pub mod directory;
pub mod ingestion;
pub mod options;
pub mod refresh;
pub mod renderer;

pub use aggregator::{Aggregation, PivotAggregator};
pub use cache_builder::{load_cache, FacetCacheBuilder};
pub use delta::{AlignedBaseline, DeltaEngine};
pub use directory::{DirectoryLoad, DirectoryLoader};
pub use ingestion::{IngestionResult, ScoreIngestion};
pub use options::FacetOptions;
pub use refresh::{RefreshOutcome, RefreshReport, RefreshService, RefreshStage};
pub use renderer::{MergeSpan, RenderedView, ViewOutcome, ViewRenderer, ViewRow, FIXED_COLUMNS};
