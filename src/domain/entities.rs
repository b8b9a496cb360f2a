//! Domain entities: core data structures

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::matrix::{HeaderRows, ProfileBreakdown};
use crate::domain::taxonomy::Solution;

/// Placeholder shown for cells without data.
pub const PLACEHOLDER: &str = "-";

/// Named region membership flags, e.g. `Brazil → true, GSI → false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionFlags(BTreeMap<String, bool>);

impl RegionFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag; an already set flag stays set.
    pub fn set(&mut self, region: impl Into<String>, member: bool) {
        let flag = self.0.entry(region.into()).or_insert(false);
        *flag |= member;
    }

    pub fn is_member(&self, region: &str) -> bool {
        self.0.get(region).copied().unwrap_or(false)
    }

    /// OR-merge another set of flags into this one.
    pub fn merge(&mut self, other: &RegionFlags) {
        for (region, member) in &other.0 {
            self.set(region.clone(), *member);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &bool)> {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for RegionFlags {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        let mut flags = RegionFlags::new();
        for (region, member) in iter {
            flags.set(region, member);
        }
        flags
    }
}

/// One normalized roster row. Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub name: String,
    /// Normalized (lowercase, no leading `@`) email domain
    pub domain: String,
    pub regions: RegionFlags,
    /// Solutions with at least one product flag set on the row
    pub solution_interest: BTreeSet<Solution>,
    pub declared_countries: BTreeSet<String>,
}

/// Partner identity and flags as resolved against the score source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Partner {
    /// Warehouse id, or a synthesized placeholder id
    pub id: String,
    pub name: String,
    pub domains: BTreeSet<String>,
    /// Present in the roster
    pub managed: bool,
    /// No match in the score source
    pub placeholder: bool,
    pub regions: RegionFlags,
    pub solution_interest: BTreeSet<Solution>,
    /// Countries flagged in the roster, independent of profile locations
    pub declared_countries: BTreeSet<String>,
}

impl Partner {
    /// Fold a matched roster entry into this partner.
    pub fn absorb(&mut self, entry: &RosterEntry) {
        self.managed = true;
        self.domains.insert(entry.domain.clone());
        self.regions.merge(&entry.regions);
        self.solution_interest
            .extend(entry.solution_interest.iter().copied());
        self.declared_countries
            .extend(entry.declared_countries.iter().cloned());
    }
}

/// Raw score row as returned by the score source.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub partner_id: String,
    pub partner_name: String,
    pub partner_domains: Vec<String>,
    pub profile_id: String,
    pub country: String,
    pub product: Option<String>,
    pub score: Option<f64>,
}

/// Filter handed to the score source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScoreQuery {
    /// Normalized roster domains
    pub domains: BTreeSet<String>,
    /// Lowercased roster names
    pub names: BTreeSet<String>,
    /// Geography allow-list
    pub countries: BTreeSet<String>,
    /// Maximum number of rows to return
    pub limit: usize,
    /// Return rows of every partner, not only those matching domains or names
    pub unfiltered: bool,
}

impl ScoreQuery {
    /// Whether a row passes this query's filters.
    pub fn accepts(&self, row: &ScoreRow) -> bool {
        if !self.countries.contains(&row.country) {
            return false;
        }
        if self.unfiltered {
            return true;
        }
        row.partner_domains.iter().any(|d| {
            crate::domain::normalize::normalize_domain(d)
                .is_some_and(|d| self.domains.contains(&d))
        }) || self
            .names
            .contains(&crate::domain::normalize::name_key(&row.partner_name))
    }
}

/// One profile's score for one product, attributed to a resolved partner.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileScore {
    pub partner_id: String,
    pub partner_name: String,
    pub profile_id: String,
    pub country: String,
    /// Absent when the profile has no scored product
    pub product: Option<String>,
    pub score: Option<f64>,
}

/// Aggregated partner: identity plus profile counts and the tier-count matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerRecord {
    pub partner: Partner,
    pub countries: BTreeSet<String>,
    pub total_profiles: u32,
    pub breakdown: ProfileBreakdown,
    pub top_country: Option<String>,
    /// Distinct-profile counts aligned with `MatrixSchema::columns`
    pub cells: Vec<u32>,
}

/// Prior matrix for one partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineRow {
    pub total_profiles: u32,
    pub cells: Vec<u32>,
}

/// Frozen prior snapshot keyed by partner id.
///
/// Carries its own column labels (`Solution|Product|Tier`) so it can be
/// realigned to a changed schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    pub columns: Vec<String>,
    pub rows: BTreeMap<String, BaselineRow>,
}

/// Change of a value against the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Unchanged,
    Increase,
    Decrease,
    /// Partner absent from the baseline
    New,
}

/// Current value with its delta against the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaCell {
    pub value: u32,
    pub delta: i64,
    pub trend: Trend,
}

impl DeltaCell {
    pub fn new(value: u32, baseline: Option<u32>) -> Self {
        match baseline {
            None => Self {
                value,
                delta: i64::from(value),
                trend: Trend::New,
            },
            Some(prior) => {
                let delta = i64::from(value) - i64::from(prior);
                let trend = match delta {
                    d if d > 0 => Trend::Increase,
                    d if d < 0 => Trend::Decrease,
                    _ => Trend::Unchanged,
                };
                Self {
                    value,
                    delta,
                    trend,
                }
            }
        }
    }

    /// Display string: `14 / (+4)`, `7 / (-2)`, `5` or the placeholder.
    pub fn display(&self) -> String {
        match self.trend {
            Trend::Increase => format!("{} / (+{})", self.value, self.delta),
            Trend::Decrease => format!("{} / ({})", self.value, self.delta),
            Trend::New | Trend::Unchanged if self.value == 0 => PLACEHOLDER.to_string(),
            Trend::New | Trend::Unchanged => self.value.to_string(),
        }
    }
}

impl fmt::Display for DeltaCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Per-partner metadata carried in the cache for filtering and dynamic columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub countries: BTreeSet<String>,
    pub managed: bool,
    pub placeholder: bool,
    pub regions: RegionFlags,
    pub solution_interest: BTreeSet<Solution>,
    pub breakdown: ProfileBreakdown,
    pub total_profiles: u32,
    pub dashboard_url: Option<String>,
    pub top_country: Option<String>,
    pub domains: BTreeSet<String>,
    #[serde(default)]
    pub declared_countries: BTreeSet<String>,
}

/// One partner row of the facet cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRow {
    pub partner_id: String,
    /// Display name, link-wrapped when a dashboard url is known
    pub name: String,
    pub total: DeltaCell,
    pub cells: Vec<DeltaCell>,
    pub metadata: CacheMetadata,
}

/// Materialized, facet-filterable readiness matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCache {
    pub headers: HeaderRows,
    pub rows: Vec<CacheRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_increase_when_displaying_then_annotated() {
        let cell = DeltaCell::new(14, Some(10));
        assert_eq!(cell.trend, Trend::Increase);
        assert_eq!(cell.delta, 4);
        assert_eq!(cell.display(), "14 / (+4)");
    }

    #[test]
    fn given_decrease_when_displaying_then_negative_delta() {
        let cell = DeltaCell::new(7, Some(9));
        assert_eq!(cell.trend, Trend::Decrease);
        assert_eq!(cell.display(), "7 / (-2)");

        let dropped = DeltaCell::new(0, Some(3));
        assert_eq!(dropped.display(), "0 / (-3)");
    }

    #[test]
    fn given_no_baseline_when_displaying_then_raw_value() {
        let cell = DeltaCell::new(5, None);
        assert_eq!(cell.trend, Trend::New);
        assert_eq!(cell.display(), "5");
        assert_eq!(DeltaCell::new(0, None).display(), PLACEHOLDER);
    }

    #[test]
    fn given_unchanged_when_displaying_then_value_or_placeholder() {
        assert_eq!(DeltaCell::new(3, Some(3)).display(), "3");
        assert_eq!(DeltaCell::new(0, Some(0)).display(), PLACEHOLDER);
    }

    #[test]
    fn given_region_flags_when_merging_then_or_semantics() {
        let mut a: RegionFlags = [("Brazil", true), ("GSI", false)].into_iter().collect();
        let b: RegionFlags = [("Brazil", false), ("GSI", true)].into_iter().collect();
        a.merge(&b);
        assert!(a.is_member("Brazil"));
        assert!(a.is_member("GSI"));
        assert!(!a.is_member("PS"));
    }
}
