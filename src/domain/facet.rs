//! Facet selection: the filter dimensions of a view

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::taxonomy::Solution;
use crate::domain::DomainError;

/// Label of the "no filter" option in every facet.
pub const ALL: &str = "All";

fn is_all(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw.eq_ignore_ascii_case(ALL)
}

/// Managed / unmanaged partner filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartnerType {
    #[default]
    All,
    Managed,
    Unmanaged,
}

impl PartnerType {
    pub fn accepts(&self, managed: bool) -> bool {
        match self {
            PartnerType::All => true,
            PartnerType::Managed => managed,
            PartnerType::Unmanaged => !managed,
        }
    }
}

impl FromStr for PartnerType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(PartnerType::All),
            "managed" => Ok(PartnerType::Managed),
            "unmanaged" => Ok(PartnerType::Unmanaged),
            _ => Err(DomainError::InvalidPartnerType(s.to_string())),
        }
    }
}

impl fmt::Display for PartnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PartnerType::All => ALL,
            PartnerType::Managed => "Managed",
            PartnerType::Unmanaged => "Unmanaged",
        };
        f.write_str(label)
    }
}

/// Single-valued facet: either no filter or one exact value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facet {
    #[default]
    All,
    Only(String),
}

impl Facet {
    /// `All` (any case) or an empty string means no filter.
    pub fn parse(raw: &str) -> Self {
        if is_all(raw) {
            Facet::All
        } else {
            Facet::Only(raw.trim().to_string())
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Facet::All => None,
            Facet::Only(v) => Some(v),
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value().unwrap_or(ALL))
    }
}

/// Multi-select solution facet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolutionSelection {
    #[default]
    All,
    Some(BTreeSet<Solution>),
}

impl SolutionSelection {
    /// Parse a comma separated list of solution labels; `All` anywhere selects all.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let mut selected = BTreeSet::new();
        for part in raw.split(',') {
            if is_all(part) {
                if !part.trim().is_empty() {
                    return Ok(SolutionSelection::All);
                }
                continue;
            }
            selected.insert(Solution::from_label(part)?);
        }
        Ok(Self::from_set(selected))
    }

    fn from_set(selected: BTreeSet<Solution>) -> Self {
        if selected.is_empty() {
            SolutionSelection::All
        } else {
            SolutionSelection::Some(selected)
        }
    }

    pub fn contains(&self, solution: Solution) -> bool {
        match self {
            SolutionSelection::All => true,
            SolutionSelection::Some(set) => set.contains(&solution),
        }
    }

    /// Toggle one option of the multi-select.
    ///
    /// `All` resets the selection. A selected solution is removed, falling back
    /// to `All` when nothing remains; an unselected one is added.
    pub fn toggle(self, value: &str) -> Result<Self, DomainError> {
        if is_all(value) {
            return Ok(SolutionSelection::All);
        }
        let solution = Solution::from_label(value)?;
        let mut set = match self {
            SolutionSelection::All => BTreeSet::new(),
            SolutionSelection::Some(set) => set,
        };
        if !set.remove(&solution) {
            set.insert(solution);
        }
        Ok(Self::from_set(set))
    }
}

impl fmt::Display for SolutionSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionSelection::All => f.write_str(ALL),
            SolutionSelection::Some(set) => {
                let labels: Vec<&str> = set.iter().map(|s| s.label()).collect();
                f.write_str(&labels.join(", "))
            }
        }
    }
}

/// Complete view filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetSelection {
    pub partner_type: PartnerType,
    pub region: Facet,
    pub country: Facet,
    pub solutions: SolutionSelection,
    pub product: Facet,
}

impl FacetSelection {
    /// Change the region; the country facet resets to `All`.
    pub fn with_region(mut self, region: Facet) -> Self {
        if self.region != region {
            self.country = Facet::All;
        }
        self.region = region;
        self
    }

    pub fn with_country(mut self, country: Facet) -> Self {
        self.country = country;
        self
    }

    /// Change the solution selection; the product facet resets to `All`.
    pub fn with_solutions(mut self, solutions: SolutionSelection) -> Self {
        if self.solutions != solutions {
            self.product = Facet::All;
        }
        self.solutions = solutions;
        self
    }

    pub fn with_product(mut self, product: Facet) -> Self {
        self.product = product;
        self
    }

    pub fn with_partner_type(mut self, partner_type: PartnerType) -> Self {
        self.partner_type = partner_type;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_partner_type_labels_when_parsing_then_case_insensitive() {
        assert_eq!("managed".parse::<PartnerType>(), Ok(PartnerType::Managed));
        assert_eq!(" Unmanaged ".parse::<PartnerType>(), Ok(PartnerType::Unmanaged));
        assert_eq!("ALL".parse::<PartnerType>(), Ok(PartnerType::All));
        assert!("partial".parse::<PartnerType>().is_err());
    }

    #[test]
    fn given_solution_selection_when_toggling_then_adds_removes_and_resets() {
        let sel = SolutionSelection::All.toggle("Databases").unwrap();
        assert_eq!(
            sel,
            SolutionSelection::Some(BTreeSet::from([Solution::Databases]))
        );

        let sel = sel.toggle("Security").unwrap();
        assert!(sel.contains(Solution::Security));
        assert!(!sel.contains(Solution::Workspace));

        let sel = sel.toggle("All").unwrap();
        assert_eq!(sel, SolutionSelection::All);
    }

    #[test]
    fn given_last_solution_when_toggled_off_then_all() {
        let sel = SolutionSelection::All.toggle("Databases").unwrap();
        assert_eq!(sel.toggle("Databases").unwrap(), SolutionSelection::All);
    }

    #[test]
    fn given_solution_list_when_parsing_then_set_or_all() {
        let sel = SolutionSelection::parse("Databases, Data & Analytics").unwrap();
        assert!(sel.contains(Solution::DataAnalytics));
        assert!(!sel.contains(Solution::Security));
        assert_eq!(SolutionSelection::parse("All").unwrap(), SolutionSelection::All);
        assert_eq!(SolutionSelection::parse("").unwrap(), SolutionSelection::All);
        assert!(SolutionSelection::parse("Quantum").is_err());
    }

    #[test]
    fn given_region_change_when_applying_then_country_resets() {
        let sel = FacetSelection::default()
            .with_region(Facet::parse("MCO"))
            .with_country(Facet::parse("Chile"))
            .with_region(Facet::parse("Brazil"));
        assert_eq!(sel.country, Facet::All);
        assert_eq!(sel.region, Facet::Only("Brazil".into()));
    }

    #[test]
    fn given_solution_change_when_applying_then_product_resets() {
        let sel = FacetSelection::default()
            .with_product(Facet::parse("BigQuery"))
            .with_solutions(SolutionSelection::parse("Databases").unwrap());
        assert_eq!(sel.product, Facet::All);
    }
}
