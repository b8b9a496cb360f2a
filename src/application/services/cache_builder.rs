//! Facet cache construction
//!
//! Single pass over the aggregated records producing the header rows and one
//! delta-annotated row per partner. The output depends on nothing but the
//! inputs, so rebuilding from the same inputs yields an identical cache.

use std::collections::BTreeMap;

use tracing::debug;

use crate::application::error::SourceKind;
use crate::application::services::delta::{AlignedBaseline, DeltaEngine};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::link::hyperlink;
use crate::domain::{CacheMetadata, CacheRow, FacetCache, MatrixSchema, PartnerRecord};
use crate::infrastructure::traits::CacheStore;

/// Service building the facet cache.
#[derive(Debug, Clone, Default)]
pub struct FacetCacheBuilder {
    schema: MatrixSchema,
    delta: DeltaEngine,
}

impl FacetCacheBuilder {
    pub fn new(schema: MatrixSchema) -> Self {
        Self {
            delta: DeltaEngine::new(schema.clone()),
            schema,
        }
    }

    /// Build the cache from aggregated records.
    ///
    /// `links` maps trimmed partner display names to dashboard urls; a linked
    /// partner's name is stored link-wrapped.
    pub fn build(
        &self,
        records: &[PartnerRecord],
        baseline: Option<&AlignedBaseline>,
        links: &BTreeMap<String, String>,
    ) -> FacetCache {
        debug!("build: {} partners", records.len());
        let rows = records
            .iter()
            .map(|record| {
                let partner = &record.partner;
                let dashboard_url = links.get(partner.name.trim()).cloned();
                let name = match &dashboard_url {
                    Some(url) => hyperlink(url, &partner.name),
                    None => partner.name.clone(),
                };
                let (total, cells) = self.delta.annotate(record, baseline);
                CacheRow {
                    partner_id: partner.id.clone(),
                    name,
                    total,
                    cells,
                    metadata: CacheMetadata {
                        countries: record.countries.clone(),
                        managed: partner.managed,
                        placeholder: partner.placeholder,
                        regions: partner.regions.clone(),
                        solution_interest: partner.solution_interest.clone(),
                        breakdown: record.breakdown.clone(),
                        total_profiles: record.total_profiles,
                        dashboard_url,
                        top_country: record.top_country.clone(),
                        domains: partner.domains.clone(),
                        declared_countries: partner.declared_countries.clone(),
                    },
                }
            })
            .collect();

        FacetCache {
            headers: self.schema.header_rows(),
            rows,
        }
    }
}

/// Load the current cache; a cache that was never built is `CacheMissing`.
pub fn load_cache(store: &dyn CacheStore) -> ApplicationResult<FacetCache> {
    store
        .load()
        .or_missing(SourceKind::Cache)?
        .ok_or_else(|| ApplicationError::CacheMissing(store.location()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::link::plain_text;
    use crate::domain::{Partner, ProfileBreakdown};

    fn record(id: &str, name: &str) -> PartnerRecord {
        PartnerRecord {
            partner: Partner {
                id: id.into(),
                name: name.into(),
                managed: true,
                ..Default::default()
            },
            countries: Default::default(),
            total_profiles: 2,
            breakdown: ProfileBreakdown::parse_compact("Chile:2").unwrap(),
            top_country: Some("Chile".into()),
            cells: vec![0; MatrixSchema::fixed().len()],
        }
    }

    #[test]
    fn given_same_inputs_when_building_twice_then_identical() {
        let builder = FacetCacheBuilder::default();
        let records = vec![record("p1", "Acme"), record("p2", "Beta")];
        let links = BTreeMap::new();

        let first = builder.build(&records, None, &links);
        let second = builder.build(&records, None, &links);

        assert_eq!(first, second);
        assert_eq!(first.headers.products.len(), MatrixSchema::fixed().len());
    }

    #[test]
    fn given_link_for_partner_when_building_then_name_wrapped_and_url_kept() {
        let builder = FacetCacheBuilder::default();
        let links = BTreeMap::from([("Acme".to_string(), "https://dash/acme".to_string())]);

        let cache = builder.build(&[record("p1", " Acme ")], None, &links);

        let row = &cache.rows[0];
        assert_eq!(row.metadata.dashboard_url.as_deref(), Some("https://dash/acme"));
        assert!(row.name.starts_with("=HYPERLINK("));
        assert_eq!(plain_text(&row.name), " Acme ");
    }
}
