//! Partner directory loading
//!
//! Turns the roster table into normalized `RosterEntry` records. Columns are
//! resolved by header name; boolean cells go through `coerce_flag`.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::error::SourceKind;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::normalize::{coerce_flag, normalize_domain, normalize_name};
use crate::domain::{solution_for, RegionFlags, RosterEntry, Solution, PRODUCTS};
use crate::infrastructure::traits::{RosterSource, Table};

pub const NAME_COLUMN: &str = "Partner Name";
pub const DOMAIN_COLUMN: &str = "Domain";

/// Marker of a struck-through roster row.
const STRUCK_PREFIX: char = '~';

/// Result of loading the roster.
#[derive(Debug, Clone, Default)]
pub struct DirectoryLoad {
    pub entries: Vec<RosterEntry>,
    /// Rows dropped for an empty or not-applicable domain
    pub discarded: usize,
    /// Rows skipped as struck through
    pub struck: usize,
    /// Expected columns absent from the roster header
    pub missing_columns: Vec<String>,
}

/// Resolved column positions of the roster.
struct Layout<'a> {
    name: Option<usize>,
    domain: usize,
    regions: Vec<(&'a str, Option<usize>)>,
    countries: Vec<(&'a str, Option<usize>)>,
    products: Vec<(Solution, Option<usize>)>,
}

fn cell(row: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("")
}

/// Service loading the partner directory.
pub struct DirectoryLoader {
    roster: Arc<dyn RosterSource>,
    settings: Arc<Settings>,
}

impl DirectoryLoader {
    pub fn new(roster: Arc<dyn RosterSource>, settings: Arc<Settings>) -> Self {
        Self { roster, settings }
    }

    /// Load and normalize the roster.
    ///
    /// An unreadable roster, an empty one or one without a `Domain` column is
    /// a `MissingSource` error. Duplicate rows are kept.
    pub fn load(&self) -> ApplicationResult<DirectoryLoad> {
        debug!("load: reading roster");
        let table = self.roster.load().or_missing(SourceKind::Directory)?;
        if table.is_empty() {
            return Err(ApplicationError::missing(
                SourceKind::Directory,
                "roster has no data rows",
            ));
        }

        let mut result = DirectoryLoad::default();
        let layout = self.layout(&table, &mut result.missing_columns)?;

        for row in &table.rows {
            let at = |idx: Option<usize>| cell(row, idx);

            if row
                .first()
                .is_some_and(|c| c.trim_start().starts_with(STRUCK_PREFIX))
            {
                result.struck += 1;
                continue;
            }

            let Some(domain) = normalize_domain(at(Some(layout.domain))) else {
                result.discarded += 1;
                continue;
            };
            if self.is_not_applicable(&domain) {
                debug!("load: discarding not-applicable domain {}", domain);
                result.discarded += 1;
                continue;
            }

            let name = match normalize_name(at(layout.name)) {
                n if n.is_empty() => domain.clone(),
                n => n,
            };

            let regions: RegionFlags = layout
                .regions
                .iter()
                .map(|(region, idx)| (*region, coerce_flag(at(*idx))))
                .collect();

            let solution_interest: BTreeSet<Solution> = layout
                .products
                .iter()
                .filter(|(_, idx)| coerce_flag(at(*idx)))
                .map(|(solution, _)| *solution)
                .collect();

            let declared_countries: BTreeSet<String> = layout
                .countries
                .iter()
                .filter(|(_, idx)| coerce_flag(at(*idx)))
                .map(|(country, _)| country.to_string())
                .collect();

            result.entries.push(RosterEntry {
                name,
                domain,
                regions,
                solution_interest,
                declared_countries,
            });
        }

        if result.entries.is_empty() {
            return Err(ApplicationError::missing(
                SourceKind::Directory,
                "roster has no usable rows",
            ));
        }

        info!(
            "load: {} roster entries ({} discarded, {} struck)",
            result.entries.len(),
            result.discarded,
            result.struck
        );
        Ok(result)
    }

    fn is_not_applicable(&self, domain: &str) -> bool {
        self.settings
            .roster
            .not_applicable
            .iter()
            .map(|s| s.trim().to_lowercase())
            .any(|s| !s.is_empty() && domain.contains(&s))
    }

    fn layout<'a>(
        &'a self,
        table: &Table,
        missing: &mut Vec<String>,
    ) -> ApplicationResult<Layout<'a>> {
        let domain = table.column(DOMAIN_COLUMN).ok_or_else(|| {
            ApplicationError::missing(SourceKind::Directory, "roster has no Domain column")
        })?;

        let mut lookup = |name: &str| {
            let idx = table.column(name);
            if idx.is_none() && !missing.iter().any(|m| m == name) {
                warn!("schema drift: roster column '{}' not found, treated as unset", name);
                missing.push(name.to_string());
            }
            idx
        };

        let name = lookup(NAME_COLUMN);
        let regions = self
            .settings
            .regions
            .iter()
            .map(|r| (r.name.as_str(), lookup(&r.name)))
            .collect();
        let countries = self
            .settings
            .ingestion
            .geography
            .iter()
            .map(|c| (c.as_str(), lookup(c)))
            .collect();
        let products = PRODUCTS
            .iter()
            .map(|(product, _)| (solution_for(product), lookup(product)))
            .collect();

        Ok(Layout {
            name,
            domain,
            regions,
            countries,
            products,
        })
    }
}
