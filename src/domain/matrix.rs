//! Fixed-schema readiness matrix: columns, header rows, per-country breakdown

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::taxonomy::{Solution, PRODUCTS};
use crate::domain::tier::Tier;
use crate::domain::DomainError;

/// One tier-count column of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub solution: Solution,
    pub product: &'static str,
    pub tier: Tier,
}

impl ColumnKey {
    /// Flat label used in persisted baselines: `Solution|Product|Tier`.
    pub fn label(&self) -> String {
        format!("{}|{}|{}", self.solution, self.product, self.tier)
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Column layout shared by aggregates, baselines and the cache.
///
/// Every catalogue product contributes four adjacent columns (Tier 1..4),
/// products appear in catalogue order.
#[derive(Debug, Clone)]
pub struct MatrixSchema {
    columns: Vec<ColumnKey>,
    index: HashMap<(&'static str, Tier), usize>,
}

impl Default for MatrixSchema {
    fn default() -> Self {
        Self::fixed()
    }
}

impl MatrixSchema {
    /// The fixed catalogue schema.
    pub fn fixed() -> Self {
        let columns: Vec<ColumnKey> = PRODUCTS
            .iter()
            .flat_map(|(product, solution)| {
                Tier::ALL.into_iter().map(move |tier| ColumnKey {
                    solution: *solution,
                    product,
                    tier,
                })
            })
            .collect();
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| ((c.product, c.tier), i))
            .collect();
        Self { columns, index }
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column position of a catalogue product / tier pair.
    pub fn position(&self, product: &str, tier: Tier) -> Option<usize> {
        let product = crate::domain::taxonomy::catalogue_product(product)?;
        self.index.get(&(product, tier)).copied()
    }

    /// Column position of a persisted `Solution|Product|Tier` label.
    pub fn position_of_label(&self, label: &str) -> Result<Option<usize>, DomainError> {
        let mut parts = label.split('|').map(str::trim);
        let (Some(solution), Some(product), Some(tier), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(DomainError::InvalidColumnLabel(label.to_string()));
        };
        let tier =
            Tier::from_label(tier).ok_or_else(|| DomainError::InvalidColumnLabel(label.to_string()))?;
        Ok(self
            .position(product, tier)
            .filter(|&p| self.columns[p].solution.label() == solution))
    }

    /// The three shared header rows over the matrix columns.
    pub fn header_rows(&self) -> HeaderRows {
        HeaderRows {
            solutions: self.columns.iter().map(|c| c.solution.label().to_string()).collect(),
            products: self.columns.iter().map(|c| c.product.to_string()).collect(),
            tiers: self.columns.iter().map(|c| c.tier.label().to_string()).collect(),
        }
    }
}

/// Solution / product / tier header rows, one entry per matrix column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRows {
    pub solutions: Vec<String>,
    pub products: Vec<String>,
    pub tiers: Vec<String>,
}

/// Distinct-profile counts per country.
///
/// Persisted compactly as `Brazil:3|Mexico:2` so views can recompute region and
/// country totals without going back to the score source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ProfileBreakdown(BTreeMap<String, u32>);

impl ProfileBreakdown {
    pub fn new(counts: BTreeMap<String, u32>) -> Self {
        Self(counts)
    }

    pub fn get(&self, country: &str) -> u32 {
        self.0.get(country).copied().unwrap_or(0)
    }

    /// Sum over a list of countries; countries without profiles count as zero.
    pub fn sum_over<'a>(&self, countries: impl IntoIterator<Item = &'a String>) -> u32 {
        countries.into_iter().map(|c| self.get(c)).sum()
    }

    pub fn countries(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &u32)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_compact(&self) -> String {
        self.0
            .iter()
            .map(|(country, n)| format!("{country}:{n}"))
            .collect::<Vec<_>>()
            .join("|")
    }

    pub fn parse_compact(raw: &str) -> Result<Self, DomainError> {
        let mut counts = BTreeMap::new();
        for pair in raw.split('|').map(str::trim).filter(|p| !p.is_empty()) {
            let (country, n) = pair
                .rsplit_once(':')
                .ok_or_else(|| DomainError::InvalidBreakdown(pair.to_string()))?;
            let n: u32 = n
                .trim()
                .parse()
                .map_err(|_| DomainError::InvalidBreakdown(pair.to_string()))?;
            *counts.entry(country.trim().to_string()).or_insert(0) += n;
        }
        Ok(Self(counts))
    }
}

impl From<ProfileBreakdown> for String {
    fn from(b: ProfileBreakdown) -> Self {
        b.to_compact()
    }
}

impl TryFrom<String> for ProfileBreakdown {
    type Error = DomainError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        ProfileBreakdown::parse_compact(&raw)
    }
}
