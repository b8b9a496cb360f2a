//! Score → tier classification

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordinal readiness bucket derived from a per-product competency score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "Tier 1")]
    Tier1,
    #[serde(rename = "Tier 2")]
    Tier2,
    #[serde(rename = "Tier 3")]
    Tier3,
    #[serde(rename = "Tier 4")]
    Tier4,
}

impl Tier {
    /// All tiers in column order.
    pub const ALL: [Tier; 4] = [Tier::Tier1, Tier::Tier2, Tier::Tier3, Tier::Tier4];

    /// Lower score bound (inclusive) of each tier, except Tier 4 which takes the rest.
    const TIER1_MIN: f64 = 50.0;
    const TIER2_MIN: f64 = 35.0;
    const TIER3_MIN: f64 = 20.0;

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Tier1 => "Tier 1",
            Tier::Tier2 => "Tier 2",
            Tier::Tier3 => "Tier 3",
            Tier::Tier4 => "Tier 4",
        }
    }

    pub fn from_label(label: &str) -> Option<Tier> {
        Tier::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a score into a tier.
///
/// `None` means "No Tier": the score was absent or not a finite number, and the
/// profile is left out of every tier-count cell for that product.
/// Fractional scores fall into the bucket of their lower bound, so 49.5 is Tier 2.
pub fn classify(score: Option<f64>) -> Option<Tier> {
    let score = score.filter(|s| s.is_finite())?;
    let tier = if score >= Tier::TIER1_MIN {
        Tier::Tier1
    } else if score >= Tier::TIER2_MIN {
        Tier::Tier2
    } else if score >= Tier::TIER3_MIN {
        Tier::Tier3
    } else {
        Tier::Tier4
    };
    Some(tier)
}

/// Parse a raw score cell. Empty or non-numeric text yields `None`.
pub fn parse_score(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|s| s.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100.0, Tier::Tier1)]
    #[case(50.0, Tier::Tier1)]
    #[case(49.0, Tier::Tier2)]
    #[case(49.5, Tier::Tier2)]
    #[case(35.0, Tier::Tier2)]
    #[case(34.0, Tier::Tier3)]
    #[case(20.0, Tier::Tier3)]
    #[case(19.0, Tier::Tier4)]
    #[case(0.0, Tier::Tier4)]
    fn given_score_when_classifying_then_returns_expected_tier(
        #[case] score: f64,
        #[case] expected: Tier,
    ) {
        assert_eq!(classify(Some(score)), Some(expected));
    }

    #[test]
    fn given_missing_or_nan_score_when_classifying_then_no_tier() {
        assert_eq!(classify(None), None);
        assert_eq!(classify(Some(f64::NAN)), None);
        assert_eq!(classify(Some(f64::INFINITY)), None);
    }

    #[test]
    fn given_raw_cells_when_parsing_score_then_non_numeric_is_none() {
        assert_eq!(parse_score(" 42 "), Some(42.0));
        assert_eq!(parse_score(""), None);
        assert_eq!(parse_score("n/a"), None);
    }

    #[test]
    fn given_label_when_parsing_tier_then_round_trips() {
        for tier in Tier::ALL {
            assert_eq!(Tier::from_label(tier.label()), Some(tier));
        }
        assert_eq!(Tier::from_label("tier 5"), None);
    }
}
