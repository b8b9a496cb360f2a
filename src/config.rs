//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/tiermatrix/tiermatrix.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `TIERMATRIX_*` prefix, `__` as section separator

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Default geography allow-list: the LATAM countries.
pub const DEFAULT_GEOGRAPHY: &[&str] = &[
    "Argentina",
    "Bolivia",
    "Brazil",
    "Chile",
    "Colombia",
    "Costa Rica",
    "Cuba",
    "Dominican Republic",
    "Ecuador",
    "El Salvador",
    "Guatemala",
    "Honduras",
    "Mexico",
    "Nicaragua",
    "Panama",
    "Paraguay",
    "Peru",
    "Uruguay",
    "Venezuela",
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A named region and the countries whose profiles count toward it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionConfig {
    pub name: String,
    #[serde(default)]
    pub countries: Vec<String>,
}

impl RegionConfig {
    fn new(name: &str, countries: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            countries: strings(countries),
        }
    }
}

/// Locations of the external sources. Relative paths resolve against `data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourcesConfig {
    /// Partner roster (CSV)
    pub roster: PathBuf,
    /// Raw per-profile scores (CSV)
    pub scores: PathBuf,
    /// Frozen baseline snapshot (JSON); deltas are skipped when unset
    pub baseline: Option<PathBuf>,
    /// Partner name → dashboard url (CSV)
    pub links: Option<PathBuf>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            roster: PathBuf::from("roster.csv"),
            scores: PathBuf::from("scores.csv"),
            baseline: Some(PathBuf::from("baseline.json")),
            links: Some(PathBuf::from("links.csv")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RosterConfig {
    /// Domain values that mark a row as not applicable (substring match)
    pub not_applicable: Vec<String>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            not_applicable: strings(&["#n/a", "n/a"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IngestionConfig {
    /// Maximum number of score rows per refresh
    pub row_cap: usize,
    /// Countries whose profiles are considered
    pub geography: Vec<String>,
    /// Id prefix of partners without a score-source match
    pub placeholder_prefix: String,
    /// Keep score-source partners that match no roster entry
    pub include_unmanaged: bool,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            row_cap: 50_000,
            geography: strings(DEFAULT_GEOGRAPHY),
            placeholder_prefix: "MISSING_BQ_".to_string(),
            include_unmanaged: false,
        }
    }
}

/// Raw sections for intermediate parsing (None → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSources {
    pub roster: Option<PathBuf>,
    pub scores: Option<PathBuf>,
    pub baseline: Option<PathBuf>,
    pub links: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawRoster {
    pub not_applicable: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawIngestion {
    pub row_cap: Option<usize>,
    pub geography: Option<Vec<String>>,
    pub placeholder_prefix: Option<String>,
    pub include_unmanaged: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub cache_path: Option<PathBuf>,
    pub sources: RawSources,
    pub roster: RawRoster,
    pub ingestion: RawIngestion,
    pub regions: Option<Vec<RegionConfig>>,
}

/// Unified configuration for tiermatrix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Base directory for sources and the cache
    pub data_dir: PathBuf,
    /// Materialized facet cache (JSON)
    pub cache_path: PathBuf,
    pub sources: SourcesConfig,
    pub roster: RosterConfig,
    pub ingestion: IngestionConfig,
    /// Regions in display order
    pub regions: Vec<RegionConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache_path: PathBuf::from("facet_cache.json"),
            sources: SourcesConfig::default(),
            roster: RosterConfig::default(),
            ingestion: IngestionConfig::default(),
            regions: default_regions(),
        }
    }
}

fn default_regions() -> Vec<RegionConfig> {
    let mco: Vec<&str> = DEFAULT_GEOGRAPHY
        .iter()
        .copied()
        .filter(|c| *c != "Brazil" && *c != "Mexico")
        .collect();
    vec![
        RegionConfig::new("Brazil", &["Brazil"]),
        RegionConfig::new("Mexico", &["Mexico"]),
        RegionConfig::new("MCO", &mco),
        RegionConfig::new("GSI", &[]),
        RegionConfig::new("PS", &[]),
    ]
}

/// Get the default data directory (XDG data dir, or ~/.tiermatrix).
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "tiermatrix")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.tiermatrix"))
}

/// Get the XDG config directory for tiermatrix.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tiermatrix").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("tiermatrix.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Overlay an optional source path; an empty path unsets it.
fn optional_path(raw: Option<&Path>, base: Option<PathBuf>) -> Option<PathBuf> {
    match raw {
        Some(path) if path.as_os_str().is_empty() => None,
        Some(path) => Some(path.to_path_buf()),
        None => base,
    }
}

/// Expand `~`, `$VAR` and `${VAR}`; unresolvable input is kept as is.
fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file (must exist)
    ///
    /// Every layer replaces what it specifies, lists included.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply(&raw);
            }
        }

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            let raw = load_raw_settings(path)?;
            current = current.apply(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply a raw overlay: specified values win, the rest is kept.
    pub fn apply(&self, raw: &RawSettings) -> Self {
        let base = self.clone();
        Self {
            data_dir: raw.data_dir.clone().unwrap_or(base.data_dir),
            cache_path: raw.cache_path.clone().unwrap_or(base.cache_path),
            sources: SourcesConfig {
                roster: raw.sources.roster.clone().unwrap_or(base.sources.roster),
                scores: raw.sources.scores.clone().unwrap_or(base.sources.scores),
                baseline: optional_path(raw.sources.baseline.as_deref(), base.sources.baseline),
                links: optional_path(raw.sources.links.as_deref(), base.sources.links),
            },
            roster: RosterConfig {
                not_applicable: raw
                    .roster
                    .not_applicable
                    .clone()
                    .unwrap_or(base.roster.not_applicable),
            },
            ingestion: IngestionConfig {
                row_cap: raw.ingestion.row_cap.unwrap_or(base.ingestion.row_cap),
                geography: raw
                    .ingestion
                    .geography
                    .clone()
                    .unwrap_or(base.ingestion.geography),
                placeholder_prefix: raw
                    .ingestion
                    .placeholder_prefix
                    .clone()
                    .unwrap_or(base.ingestion.placeholder_prefix),
                include_unmanaged: raw
                    .ingestion
                    .include_unmanaged
                    .unwrap_or(base.ingestion.include_unmanaged),
            },
            regions: raw.regions.clone().unwrap_or(base.regions),
        }
    }

    /// Apply TIERMATRIX_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("TIERMATRIX")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("ingestion.geography")
                .with_list_parse_key("roster.not_applicable")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("data_dir") {
            settings.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("cache_path") {
            settings.cache_path = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("sources.roster") {
            settings.sources.roster = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("sources.scores") {
            settings.sources.scores = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("sources.baseline") {
            settings.sources.baseline = optional_path(Some(Path::new(&val)), None);
        }
        if let Ok(val) = config.get_string("sources.links") {
            settings.sources.links = optional_path(Some(Path::new(&val)), None);
        }
        if let Ok(val) = config.get::<Vec<String>>("roster.not_applicable") {
            settings.roster.not_applicable = val;
        }
        if let Ok(val) = config.get::<usize>("ingestion.row_cap") {
            settings.ingestion.row_cap = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("ingestion.geography") {
            settings.ingestion.geography = val;
        }
        if let Ok(val) = config.get_string("ingestion.placeholder_prefix") {
            settings.ingestion.placeholder_prefix = val;
        }
        if let Ok(val) = config.get_bool("ingestion.include_unmanaged") {
            settings.ingestion.include_unmanaged = val;
        }

        Ok(settings)
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.data_dir = expand(&self.data_dir);
        self.cache_path = expand(&self.cache_path);
        self.sources.roster = expand(&self.sources.roster);
        self.sources.scores = expand(&self.sources.scores);
        self.sources.baseline = self.sources.baseline.as_deref().map(expand);
        self.sources.links = self.sources.links.as_deref().map(expand);
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.ingestion.row_cap == 0 {
            return Err(ApplicationError::Config {
                message: "ingestion.row_cap must be greater than 0".into(),
            });
        }
        if self.ingestion.placeholder_prefix.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "ingestion.placeholder_prefix must not be empty".into(),
            });
        }
        let mut seen = BTreeSet::new();
        for region in &self.regions {
            if !seen.insert(region.name.as_str()) {
                return Err(ApplicationError::Config {
                    message: format!("duplicate region: {}", region.name),
                });
            }
        }
        Ok(())
    }

    /// Resolve a configured path against `data_dir`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    pub fn roster_path(&self) -> PathBuf {
        self.resolve(&self.sources.roster)
    }

    pub fn scores_path(&self) -> PathBuf {
        self.resolve(&self.sources.scores)
    }

    pub fn baseline_path(&self) -> Option<PathBuf> {
        self.sources.baseline.as_deref().map(|p| self.resolve(p))
    }

    pub fn links_path(&self) -> Option<PathBuf> {
        self.sources.links.as_deref().map(|p| self.resolve(p))
    }

    pub fn cache_file(&self) -> PathBuf {
        self.resolve(&self.cache_path)
    }

    pub fn region(&self, name: &str) -> Option<&RegionConfig> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn region_names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.name.as_str())
    }

    pub fn geography(&self) -> BTreeSet<String> {
        self.ingestion.geography.iter().cloned().collect()
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r##"# tiermatrix configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/tiermatrix/tiermatrix.toml
#   File:   --config <path>
#   Env:    TIERMATRIX_* environment variables, e.g. TIERMATRIX_INGESTION__ROW_CAP=1000
#
# Each layer replaces the values it specifies; lists are replaced, not merged.

# Base directory; relative source and cache paths resolve against it
# data_dir = "~/.local/share/tiermatrix"

# Materialized facet cache, rewritten on every refresh
# cache_path = "facet_cache.json"

[sources]
# roster = "roster.csv"
# scores = "scores.csv"
# Optional sources; an empty string turns them off
# baseline = "baseline.json"
# links = "links.csv"

[roster]
# Domain values marking a roster row as not applicable
# not_applicable = ["#n/a", "n/a"]

[ingestion]
# Score rows beyond this cap are dropped with a warning
# row_cap = 50000
# geography = ["Argentina", "Brazil", "Chile", "Mexico"]
# placeholder_prefix = "MISSING_BQ_"
# Keep partners from the score source that are not in the roster
# include_unmanaged = false

# Regions in display order; each needs a matching roster column
# [[regions]]
# name = "Brazil"
# countries = ["Brazil"]
#
# [[regions]]
# name = "GSI"
# countries = []
"##
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_then_five_regions_and_latam_geography() {
        let settings = Settings::default();
        let names: Vec<&str> = settings.region_names().collect();
        assert_eq!(names, vec!["Brazil", "Mexico", "MCO", "GSI", "PS"]);
        assert_eq!(settings.ingestion.geography.len(), 19);
        let mco = settings.region("MCO").unwrap();
        assert!(mco.countries.contains(&"Chile".to_string()));
        assert!(!mco.countries.contains(&"Brazil".to_string()));
    }

    #[test]
    fn given_raw_overlay_when_applying_then_specified_values_replace() {
        let raw = RawSettings {
            ingestion: RawIngestion {
                row_cap: Some(10),
                geography: Some(vec!["Peru".into()]),
                ..Default::default()
            },
            ..Default::default()
        };

        let settings = Settings::default().apply(&raw);

        assert_eq!(settings.ingestion.row_cap, 10);
        assert_eq!(settings.ingestion.geography, vec!["Peru".to_string()]);
        assert_eq!(settings.ingestion.placeholder_prefix, "MISSING_BQ_");
        assert_eq!(settings.regions.len(), 5);
    }

    #[test]
    fn given_relative_source_when_resolving_then_joined_with_data_dir() {
        let settings = Settings {
            data_dir: PathBuf::from("/data"),
            ..Default::default()
        };
        assert_eq!(settings.roster_path(), PathBuf::from("/data/roster.csv"));
        assert_eq!(
            settings.resolve(Path::new("/abs/scores.csv")),
            PathBuf::from("/abs/scores.csv")
        );
    }

    #[test]
    fn given_tilde_in_data_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            data_dir: PathBuf::from("~/.tiermatrix"),
            ..Default::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let dir = settings.data_dir.to_string_lossy();
        assert!(dir.starts_with(&home), "data_dir should start with home: {dir}");
        assert!(!dir.contains('~'));
    }

    #[test]
    fn given_template_when_parsing_then_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("template parses");
        assert!(raw.data_dir.is_none());
        assert!(raw.regions.is_none());
    }

    #[test]
    fn given_zero_row_cap_when_validating_then_error() {
        let mut settings = Settings::default();
        settings.ingestion.row_cap = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn given_duplicate_region_when_validating_then_error() {
        let mut settings = Settings::default();
        settings.regions.push(RegionConfig::new("Brazil", &["Brazil"]));
        assert!(settings.validate().is_err());
    }
}
