//! Pivot aggregation of profile scores into the tier-count matrix

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use crate::domain::taxonomy::catalogue_product;
use crate::domain::{
    classify, MatrixSchema, Partner, PartnerRecord, ProfileBreakdown, ProfileScore,
};

/// Output of one aggregation.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// One record per partner, ordered by partner id
    pub records: Vec<PartnerRecord>,
    /// Score rows per product outside the catalogue
    pub unknown_products: BTreeMap<String, usize>,
    /// Distinct profiles over all partners
    pub profiles: usize,
}

/// Distinct-profile sets of one partner, borrowed from the score rows.
struct Accumulator<'a> {
    profiles: HashSet<&'a str>,
    by_country: BTreeMap<&'a str, HashSet<&'a str>>,
    cells: Vec<HashSet<&'a str>>,
}

impl<'a> Accumulator<'a> {
    fn new(width: usize) -> Self {
        Self {
            profiles: HashSet::new(),
            by_country: BTreeMap::new(),
            cells: vec![HashSet::new(); width],
        }
    }
}

/// Service pivoting profile scores into per-partner records.
#[derive(Debug, Clone, Default)]
pub struct PivotAggregator {
    schema: MatrixSchema,
}

impl PivotAggregator {
    pub fn new(schema: MatrixSchema) -> Self {
        Self { schema }
    }

    /// Aggregate scores per partner.
    ///
    /// Total profiles count every distinct profile of the partner, including
    /// profiles without any scored product. Cells count distinct profiles per
    /// (product, tier); unscored and unknown products contribute to no cell.
    pub fn aggregate(&self, partners: &[Partner], scores: &[ProfileScore]) -> Aggregation {
        debug!(
            "aggregate: {} partners, {} score rows",
            partners.len(),
            scores.len()
        );
        let mut acc: HashMap<&str, Accumulator> = HashMap::new();
        let mut unknown_products: BTreeMap<String, usize> = BTreeMap::new();
        let mut all_profiles: HashSet<(&str, &str)> = HashSet::new();

        for score in scores {
            let a = acc
                .entry(score.partner_id.as_str())
                .or_insert_with(|| Accumulator::new(self.schema.len()));
            let profile = score.profile_id.as_str();
            a.profiles.insert(profile);
            a.by_country
                .entry(score.country.as_str())
                .or_default()
                .insert(profile);
            all_profiles.insert((score.partner_id.as_str(), profile));

            let Some(product) = score.product.as_deref() else {
                continue;
            };
            if catalogue_product(product).is_none() {
                *unknown_products.entry(product.trim().to_string()).or_insert(0) += 1;
                continue;
            }
            if let Some(pos) =
                classify(score.score).and_then(|tier| self.schema.position(product, tier))
            {
                a.cells[pos].insert(profile);
            }
        }

        for (product, rows) in &unknown_products {
            warn!(
                "aggregate: {} score rows for product '{}' outside the catalogue",
                rows, product
            );
        }

        let mut records: Vec<PartnerRecord> = partners
            .iter()
            .map(|partner| match acc.get(partner.id.as_str()) {
                Some(a) => self.record(partner, a),
                None => PartnerRecord {
                    partner: partner.clone(),
                    countries: BTreeSet::new(),
                    total_profiles: 0,
                    breakdown: ProfileBreakdown::default(),
                    top_country: None,
                    cells: vec![0; self.schema.len()],
                },
            })
            .collect();
        records.sort_by(|a, b| a.partner.id.cmp(&b.partner.id));

        Aggregation {
            records,
            unknown_products,
            profiles: all_profiles.len(),
        }
    }

    fn record(&self, partner: &Partner, a: &Accumulator) -> PartnerRecord {
        let counts: BTreeMap<String, u32> = a
            .by_country
            .iter()
            .map(|(country, profiles)| (country.to_string(), count(profiles)))
            .collect();
        PartnerRecord {
            partner: partner.clone(),
            countries: counts.keys().cloned().collect(),
            total_profiles: count(&a.profiles),
            top_country: top_country(&counts),
            breakdown: ProfileBreakdown::new(counts),
            cells: a.cells.iter().map(count).collect(),
        }
    }
}

fn count(set: &HashSet<&str>) -> u32 {
    u32::try_from(set.len()).unwrap_or(u32::MAX)
}

/// Country with the most profiles; ties go to the alphabetically first country.
pub fn top_country(counts: &BTreeMap<String, u32>) -> Option<String> {
    counts
        .iter()
        .fold(None::<(&String, u32)>, |best, (country, n)| match best {
            Some((_, best_n)) if best_n >= *n => best,
            _ => Some((country, *n)),
        })
        .map(|(country, _)| country.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tier;

    fn partner(id: &str) -> Partner {
        Partner {
            id: id.into(),
            name: id.into(),
            managed: true,
            ..Default::default()
        }
    }

    fn score(
        partner: &str,
        profile: &str,
        country: &str,
        product: Option<&str>,
        s: Option<f64>,
    ) -> ProfileScore {
        ProfileScore {
            partner_id: partner.into(),
            partner_name: partner.into(),
            profile_id: profile.into(),
            country: country.into(),
            product: product.map(String::from),
            score: s,
        }
    }

    #[test]
    fn given_profiles_without_products_when_aggregating_then_counted_in_total() {
        let agg = PivotAggregator::default();
        let scores = vec![
            score("p1", "a", "Chile", Some("Cloud SQL"), Some(60.0)),
            score("p1", "b", "Chile", None, None),
            score("p1", "c", "Peru", Some("Cloud SQL"), None),
        ];

        let result = agg.aggregate(&[partner("p1")], &scores);

        let record = &result.records[0];
        assert_eq!(record.total_profiles, 3);
        let pos = MatrixSchema::fixed().position("Cloud SQL", Tier::Tier1).unwrap();
        assert_eq!(record.cells[pos], 1);
        assert_eq!(record.cells.iter().sum::<u32>(), 1);
    }

    #[test]
    fn given_duplicate_rows_when_aggregating_then_profiles_distinct() {
        let agg = PivotAggregator::default();
        let scores = vec![
            score("p1", "a", "Chile", Some("BigQuery"), Some(40.0)),
            score("p1", "a", "Chile", Some("BigQuery"), Some(40.0)),
            score("p1", "a", "Chile", Some("Looker"), Some(10.0)),
        ];

        let result = agg.aggregate(&[partner("p1")], &scores);

        let record = &result.records[0];
        let schema = MatrixSchema::fixed();
        assert_eq!(record.total_profiles, 1);
        assert_eq!(record.cells[schema.position("BigQuery", Tier::Tier2).unwrap()], 1);
        assert_eq!(record.cells[schema.position("Looker", Tier::Tier4).unwrap()], 1);
    }

    #[test]
    fn given_unknown_product_when_aggregating_then_reported_not_counted() {
        let agg = PivotAggregator::default();
        let scores = vec![score("p1", "a", "Chile", Some("Firebase"), Some(90.0))];

        let result = agg.aggregate(&[partner("p1")], &scores);

        assert_eq!(result.unknown_products.get("Firebase"), Some(&1));
        assert_eq!(result.records[0].cells.iter().sum::<u32>(), 0);
        assert_eq!(result.records[0].total_profiles, 1);
    }

    #[test]
    fn given_partner_without_scores_when_aggregating_then_zero_record() {
        let agg = PivotAggregator::default();
        let result = agg.aggregate(&[partner("MISSING_BQ_Acme")], &[]);
        let record = &result.records[0];
        assert_eq!(record.total_profiles, 0);
        assert_eq!(record.top_country, None);
        assert!(record.breakdown.is_empty());
    }

    #[test]
    fn given_country_tie_when_picking_top_then_alphabetical() {
        let counts = BTreeMap::from([
            ("Peru".to_string(), 2),
            ("Chile".to_string(), 2),
            ("Brazil".to_string(), 1),
        ]);
        assert_eq!(top_country(&counts), Some("Chile".to_string()));
        assert_eq!(top_country(&BTreeMap::new()), None);
    }

    #[test]
    fn given_profiles_in_countries_when_aggregating_then_breakdown_and_countries() {
        let agg = PivotAggregator::default();
        let scores = vec![
            score("p1", "a", "Mexico", None, None),
            score("p1", "b", "Brazil", None, None),
            score("p1", "c", "Brazil", None, None),
        ];

        let result = agg.aggregate(&[partner("p1")], &scores);

        let record = &result.records[0];
        assert_eq!(record.breakdown.to_compact(), "Brazil:2|Mexico:1");
        assert_eq!(record.top_country.as_deref(), Some("Brazil"));
        assert_eq!(record.countries.len(), 2);
    }
}
