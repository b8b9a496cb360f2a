//! Selectable values of each facet
//!
//! Country and product lists cascade from the region and solution selections.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::facet::ALL;
use crate::domain::{Facet, FacetCache, Solution, SolutionSelection};

/// Service listing facet options.
pub struct FacetOptions {
    settings: Arc<Settings>,
}

fn with_all(values: impl IntoIterator<Item = String>) -> Vec<String> {
    std::iter::once(ALL.to_string()).chain(values).collect()
}

impl FacetOptions {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    pub fn partner_types(&self) -> Vec<String> {
        ["All", "Managed", "Unmanaged"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn solutions(&self) -> Vec<String> {
        with_all(Solution::CATALOGUE.iter().map(|s| s.label().to_string()))
    }

    pub fn regions(&self) -> Vec<String> {
        with_all(self.settings.region_names().map(String::from))
    }

    /// Countries of the partners in `region`, sorted.
    ///
    /// Roster-declared countries count as well, so a country is selectable
    /// before any profile there has been scored.
    pub fn countries(&self, cache: &FacetCache, region: &Facet) -> Vec<String> {
        let countries: BTreeSet<String> = cache
            .rows
            .iter()
            .filter(|row| match region {
                Facet::All => true,
                Facet::Only(r) => row.metadata.regions.is_member(r),
            })
            .flat_map(|row| {
                row.metadata
                    .countries
                    .iter()
                    .chain(&row.metadata.declared_countries)
                    .cloned()
            })
            .collect();
        with_all(countries)
    }

    /// Products of the selected solutions, sorted; only `All` when every solution is selected.
    pub fn products(&self, solutions: &SolutionSelection) -> Vec<String> {
        match solutions {
            SolutionSelection::All => with_all(std::iter::empty()),
            SolutionSelection::Some(set) => {
                let products: BTreeSet<String> = set
                    .iter()
                    .flat_map(|s| s.products())
                    .map(String::from)
                    .collect();
                with_all(products)
            }
        }
    }

    /// Toggle one value of the solution multi-select.
    pub fn toggle_solution(
        &self,
        selection: SolutionSelection,
        value: &str,
    ) -> ApplicationResult<SolutionSelection> {
        Ok(selection.toggle(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_settings_then_regions_start_with_all() {
        let options = FacetOptions::new(Arc::new(Settings::default()));
        assert_eq!(
            options.regions(),
            vec!["All", "Brazil", "Mexico", "MCO", "GSI", "PS"]
        );
        assert_eq!(options.solutions().len(), 8);
    }

    #[test]
    fn given_solution_selection_when_listing_products_then_sorted_union() {
        let options = FacetOptions::new(Arc::new(Settings::default()));
        let selection = SolutionSelection::parse("Data & Analytics").unwrap();
        assert_eq!(
            options.products(&selection),
            vec!["All", "BigQuery", "Dataflow", "Dataproc", "Looker"]
        );
        assert_eq!(options.products(&SolutionSelection::All), vec!["All"]);
    }
}
