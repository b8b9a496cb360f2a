//! Facet filtering and view rendering
//!
//! Applies a `FacetSelection` to the facet cache: keeps the matching matrix
//! columns and partner rows, computes the region and country columns from the
//! stored profile breakdown, sorts by plain display name and derives the
//! header merge spans.

use std::sync::Arc;

use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::link::plain_text;
use crate::domain::{
    CacheRow, Facet, FacetCache, FacetSelection, HeaderRows, SolutionSelection, PLACEHOLDER,
};

/// Leading columns of every view.
pub const FIXED_COLUMNS: [&str; 5] = [
    "Partner ID",
    "Partner Name",
    "Total Profiles",
    "Region Profiles",
    "Country Profiles",
];

/// Contiguous run of equal header labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeSpan {
    /// Column index in the full view, fixed columns included
    pub start: usize,
    pub len: usize,
    pub label: String,
}

/// One rendered partner row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewRow {
    pub partner_id: String,
    /// Name cell as stored, possibly link-wrapped
    pub name: String,
    pub plain_name: String,
    pub dashboard_url: Option<String>,
    pub total: String,
    pub region: String,
    pub country: String,
    pub cells: Vec<String>,
}

/// Filtered and sorted view over the facet cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedView {
    pub fixed_columns: Vec<String>,
    /// Header rows of the retained matrix columns
    pub headers: HeaderRows,
    pub rows: Vec<ViewRow>,
    pub solution_spans: Vec<MergeSpan>,
    pub product_spans: Vec<MergeSpan>,
}

impl RenderedView {
    /// Total number of columns, fixed ones included.
    pub fn width(&self) -> usize {
        self.fixed_columns.len() + self.headers.tiers.len()
    }
}

/// Result of rendering a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutcome {
    Rows(RenderedView),
    /// No partner matches the selection
    NoResults,
}

/// Service rendering facet-filtered views.
pub struct ViewRenderer {
    settings: Arc<Settings>,
}

fn count_cell(n: u32) -> String {
    if n == 0 {
        PLACEHOLDER.to_string()
    } else {
        n.to_string()
    }
}

impl ViewRenderer {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    pub fn render(
        &self,
        cache: &FacetCache,
        selection: &FacetSelection,
    ) -> ApplicationResult<ViewOutcome> {
        debug!("render: {:?}", selection);
        let region_countries = match &selection.region {
            Facet::All => None,
            Facet::Only(name) => Some(
                self.settings
                    .region(name)
                    .map(|r| r.countries.clone())
                    .ok_or_else(|| ApplicationError::Config {
                        message: format!("unknown region: {name}"),
                    })?,
            ),
        };

        let kept = retained_columns(&cache.headers, selection);

        let mut rows: Vec<ViewRow> = cache
            .rows
            .iter()
            .filter(|row| row_matches(row, selection))
            .map(|row| {
                let meta = &row.metadata;
                let region = match &region_countries {
                    None => meta.total_profiles,
                    Some(countries) => meta.breakdown.sum_over(countries),
                };
                let country = match &selection.country {
                    Facet::All => region,
                    Facet::Only(c) => meta.breakdown.get(c),
                };
                ViewRow {
                    partner_id: row.partner_id.clone(),
                    name: row.name.clone(),
                    plain_name: plain_text(&row.name),
                    dashboard_url: meta.dashboard_url.clone(),
                    total: row.total.display(),
                    region: count_cell(region),
                    country: count_cell(country),
                    cells: kept
                        .iter()
                        .map(|i| {
                            row.cells
                                .get(*i)
                                .map(|c| c.display())
                                .unwrap_or_else(|| PLACEHOLDER.to_string())
                        })
                        .collect(),
                }
            })
            .collect();

        if rows.is_empty() {
            debug!("render: no rows for selection");
            return Ok(ViewOutcome::NoResults);
        }

        rows.sort_by_cached_key(|r| (r.plain_name.to_lowercase(), r.partner_id.clone()));

        let headers = HeaderRows {
            solutions: pick(&cache.headers.solutions, &kept),
            products: pick(&cache.headers.products, &kept),
            tiers: pick(&cache.headers.tiers, &kept),
        };
        let offset = FIXED_COLUMNS.len();
        let solution_spans = merge_spans(headers.solutions.iter().map(|s| (s, s)), offset);
        let product_spans = merge_spans(
            headers
                .solutions
                .iter()
                .zip(&headers.products)
                .map(|(s, p)| ((s, p), p)),
            offset,
        );

        Ok(ViewOutcome::Rows(RenderedView {
            fixed_columns: FIXED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            headers,
            rows,
            solution_spans,
            product_spans,
        }))
    }
}

/// Indices of the matrix columns kept by the solution and product facets.
fn retained_columns(headers: &HeaderRows, selection: &FacetSelection) -> Vec<usize> {
    headers
        .solutions
        .iter()
        .zip(&headers.products)
        .enumerate()
        .filter(|(_, (solution, product))| {
            let solution_ok = match &selection.solutions {
                SolutionSelection::All => true,
                SolutionSelection::Some(set) => {
                    set.iter().any(|s| s.label() == solution.as_str())
                }
            };
            let product_ok = match &selection.product {
                Facet::All => true,
                Facet::Only(p) => p == *product,
            };
            solution_ok && product_ok
        })
        .map(|(i, _)| i)
        .collect()
}

fn row_matches(row: &CacheRow, selection: &FacetSelection) -> bool {
    let meta = &row.metadata;
    if !selection.partner_type.accepts(meta.managed) {
        return false;
    }
    if let Facet::Only(region) = &selection.region {
        if !meta.regions.is_member(region) {
            return false;
        }
    }
    if let Facet::Only(country) = &selection.country {
        if !meta.countries.contains(country) {
            return false;
        }
    }
    true
}

fn pick(values: &[String], kept: &[usize]) -> Vec<String> {
    kept.iter().filter_map(|i| values.get(*i).cloned()).collect()
}

/// Spans over contiguous runs of equal keys, labelled with the run's label.
pub fn merge_spans<'a, K: PartialEq + Clone>(
    keys: impl Iterator<Item = (K, &'a String)>,
    offset: usize,
) -> Vec<MergeSpan> {
    let mut spans = Vec::new();
    let mut start = offset;
    let chunks = keys.chunk_by(|(key, _)| key.clone());
    for (_, mut run) in &chunks {
        let Some((_, label)) = run.next() else {
            continue;
        };
        let len = 1 + run.count();
        spans.push(MergeSpan {
            start,
            len,
            label: label.clone(),
        });
        start += len;
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_runs_when_merging_then_spans_cover_columns() {
        let labels: Vec<String> = ["A", "A", "B", "A"].iter().map(|s| s.to_string()).collect();
        let spans = merge_spans(labels.iter().map(|s| (s, s)), 5);
        assert_eq!(
            spans,
            vec![
                MergeSpan { start: 5, len: 2, label: "A".into() },
                MergeSpan { start: 7, len: 1, label: "B".into() },
                MergeSpan { start: 8, len: 1, label: "A".into() },
            ]
        );
    }

    #[test]
    fn given_no_columns_when_merging_then_no_spans() {
        let labels: Vec<String> = vec![];
        assert!(merge_spans(labels.iter().map(|s| (s, s)), 5).is_empty());
    }
}
