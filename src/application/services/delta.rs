//! Baseline delta engine
//!
//! Compares current aggregates against a frozen baseline snapshot. The
//! snapshot carries its own column labels and is realigned to the live schema
//! before comparison; it is never modified.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::domain::{
    BaselineRow, BaselineSnapshot, DeltaCell, FacetCache, MatrixSchema, PartnerRecord,
};

/// Baseline rows realigned to the live schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignedBaseline {
    /// partner id → (total profiles, cells aligned with the schema)
    rows: BTreeMap<String, (u32, Vec<u32>)>,
    /// Schema columns the baseline has no data for
    pub missing_columns: usize,
    /// Baseline columns unknown to the schema
    pub ignored_columns: usize,
}

/// Service computing delta-annotated matrices.
#[derive(Debug, Clone, Default)]
pub struct DeltaEngine {
    schema: MatrixSchema,
}

impl DeltaEngine {
    pub fn new(schema: MatrixSchema) -> Self {
        Self { schema }
    }

    /// Realign a baseline to the live schema by `Solution|Product|Tier` label.
    ///
    /// Baseline columns unknown to the schema are ignored; schema columns
    /// missing from the baseline read as zero.
    pub fn align(&self, baseline: &BaselineSnapshot) -> AlignedBaseline {
        let mut mapping: Vec<Option<usize>> = Vec::with_capacity(baseline.columns.len());
        let mut covered = vec![false; self.schema.len()];
        let mut ignored_columns = 0;
        for label in &baseline.columns {
            let pos = match self.schema.position_of_label(label) {
                Ok(pos) => pos,
                Err(e) => {
                    warn!("schema drift: {}", e);
                    None
                }
            };
            match pos {
                Some(p) => covered[p] = true,
                None => ignored_columns += 1,
            }
            mapping.push(pos);
        }

        let missing_columns = covered.iter().filter(|c| !**c).count();
        if missing_columns > 0 {
            warn!(
                "schema drift: baseline lacks {} matrix columns, compared against zero",
                missing_columns
            );
        }
        if ignored_columns > 0 {
            warn!(
                "schema drift: {} baseline columns unknown to the matrix, ignored",
                ignored_columns
            );
        }

        let rows = baseline
            .rows
            .iter()
            .map(|(id, row)| {
                let mut cells = vec![0; self.schema.len()];
                for (value, pos) in row.cells.iter().zip(&mapping) {
                    if let Some(p) = pos {
                        cells[*p] = *value;
                    }
                }
                (id.clone(), (row.total_profiles, cells))
            })
            .collect();

        debug!("align: {} baseline partners", baseline.rows.len());
        AlignedBaseline {
            rows,
            missing_columns,
            ignored_columns,
        }
    }

    /// Delta-annotate one partner's total and matrix.
    ///
    /// A partner absent from the baseline (or no baseline at all) compares
    /// against zero and is marked `New`.
    pub fn annotate(
        &self,
        record: &PartnerRecord,
        baseline: Option<&AlignedBaseline>,
    ) -> (DeltaCell, Vec<DeltaCell>) {
        let prior = baseline.and_then(|b| b.rows.get(&record.partner.id));
        let total = DeltaCell::new(record.total_profiles, prior.map(|(t, _)| *t));
        let cells = record
            .cells
            .iter()
            .enumerate()
            .map(|(i, value)| {
                DeltaCell::new(*value, prior.map(|(_, c)| c.get(i).copied().unwrap_or(0)))
            })
            .collect();
        (total, cells)
    }

    /// Freeze the current cache values as the next baseline.
    pub fn freeze(&self, cache: &FacetCache) -> BaselineSnapshot {
        let headers = &cache.headers;
        let columns = headers
            .solutions
            .iter()
            .zip(&headers.products)
            .zip(&headers.tiers)
            .map(|((solution, product), tier)| format!("{solution}|{product}|{tier}"))
            .collect();
        let rows = cache
            .rows
            .iter()
            .map(|row| {
                (
                    row.partner_id.clone(),
                    BaselineRow {
                        total_profiles: row.total.value,
                        cells: row.cells.iter().map(|c| c.value).collect(),
                    },
                )
            })
            .collect();
        BaselineSnapshot { columns, rows }
    }
}
