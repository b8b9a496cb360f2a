//! Product catalogue and product → solution mapping

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Named grouping of related products used for rollup reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Solution {
    #[serde(rename = "Infrastructure Modernization")]
    InfrastructureModernization,
    #[serde(rename = "Application Modernization")]
    ApplicationModernization,
    #[serde(rename = "Databases")]
    Databases,
    #[serde(rename = "Data & Analytics")]
    DataAnalytics,
    #[serde(rename = "Artificial Intelligence")]
    ArtificialIntelligence,
    #[serde(rename = "Security")]
    Security,
    #[serde(rename = "Workspace")]
    Workspace,
    /// Catch-all for products outside the catalogue. Never part of the matrix.
    #[serde(rename = "Other")]
    Other,
}

impl Solution {
    /// The seven catalogue solutions, in matrix order.
    pub const CATALOGUE: [Solution; 7] = [
        Solution::InfrastructureModernization,
        Solution::ApplicationModernization,
        Solution::Databases,
        Solution::DataAnalytics,
        Solution::ArtificialIntelligence,
        Solution::Security,
        Solution::Workspace,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Solution::InfrastructureModernization => "Infrastructure Modernization",
            Solution::ApplicationModernization => "Application Modernization",
            Solution::Databases => "Databases",
            Solution::DataAnalytics => "Data & Analytics",
            Solution::ArtificialIntelligence => "Artificial Intelligence",
            Solution::Security => "Security",
            Solution::Workspace => "Workspace",
            Solution::Other => "Other",
        }
    }

    /// Parse a catalogue solution label (case-insensitive). "Other" is not selectable.
    pub fn from_label(label: &str) -> Result<Solution, DomainError> {
        let wanted = label.trim();
        Solution::CATALOGUE
            .into_iter()
            .find(|s| s.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::UnknownSolution(wanted.to_string()))
    }

    /// Products of this solution in catalogue order.
    pub fn products(&self) -> impl Iterator<Item = &'static str> + '_ {
        PRODUCTS
            .iter()
            .filter(move |(_, s)| s == self)
            .map(|(p, _)| *p)
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed product catalogue in matrix order.
pub const PRODUCTS: &[(&str, Solution)] = &[
    ("Google Compute Engine", Solution::InfrastructureModernization),
    ("Google Cloud Networking", Solution::InfrastructureModernization),
    ("SAP on Google Cloud", Solution::InfrastructureModernization),
    ("Google Cloud VMware Engine", Solution::InfrastructureModernization),
    ("Google Distributed Cloud", Solution::InfrastructureModernization),
    ("Google Kubernetes Engine", Solution::ApplicationModernization),
    ("Apigee API Management", Solution::ApplicationModernization),
    ("Cloud SQL", Solution::Databases),
    ("AlloyDB for PostgreSQL", Solution::Databases),
    ("Spanner", Solution::Databases),
    ("Cloud Run", Solution::Databases),
    ("Oracle", Solution::Databases),
    ("BigQuery", Solution::DataAnalytics),
    ("Looker", Solution::DataAnalytics),
    ("Dataflow", Solution::DataAnalytics),
    ("Dataproc", Solution::DataAnalytics),
    ("Vertex AI Platform", Solution::ArtificialIntelligence),
    ("AI Applications", Solution::ArtificialIntelligence),
    ("Gemini Enterprise", Solution::ArtificialIntelligence),
    ("Customer Engagement Suite", Solution::ArtificialIntelligence),
    ("Cloud Security", Solution::Security),
    ("Security Command Center", Solution::Security),
    ("Security Operations", Solution::Security),
    ("Google Threat Intelligence", Solution::Security),
    ("Workspace", Solution::Workspace),
];

/// Map a product name to its solution. Unrecognized names map to `Solution::Other`.
pub fn solution_for(product: &str) -> Solution {
    let product = product.trim();
    PRODUCTS
        .iter()
        .find(|(p, _)| *p == product)
        .map(|(_, s)| *s)
        .unwrap_or(Solution::Other)
}

/// Catalogue spelling of a product, if it is one.
pub fn catalogue_product(product: &str) -> Option<&'static str> {
    let product = product.trim();
    PRODUCTS.iter().find(|(p, _)| *p == product).map(|(p, _)| *p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_every_catalogue_product_when_mapping_then_never_other() {
        for (product, solution) in PRODUCTS {
            assert_eq!(solution_for(product), *solution, "{product}");
            assert_ne!(solution_for(product), Solution::Other);
        }
    }

    #[test]
    fn given_unknown_product_when_mapping_then_other() {
        assert_eq!(solution_for("Firebase"), Solution::Other);
        assert_eq!(solution_for(""), Solution::Other);
        // exact match only
        assert_eq!(solution_for("bigquery"), Solution::Other);
    }

    #[test]
    fn given_padded_product_when_mapping_then_trimmed() {
        assert_eq!(solution_for("  BigQuery "), Solution::DataAnalytics);
    }

    #[test]
    fn given_catalogue_when_grouping_then_each_solution_has_products() {
        for solution in Solution::CATALOGUE {
            assert!(solution.products().count() > 0, "{solution}");
        }
        assert_eq!(Solution::DataAnalytics.products().count(), 4);
        assert_eq!(Solution::Other.products().count(), 0);
    }

    #[test]
    fn given_labels_when_parsing_solution_then_case_insensitive() {
        assert_eq!(
            Solution::from_label("data & analytics"),
            Ok(Solution::DataAnalytics)
        );
        assert!(Solution::from_label("Other").is_err());
        assert!(Solution::from_label("Quantum").is_err());
    }
}
