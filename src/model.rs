//! Journal, category and quartile types

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rank bucket of a journal within one subject category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quartile {
    #[serde(rename = "Q1")]
    Q1,
    #[serde(rename = "Q2")]
    Q2,
    #[serde(rename = "Q3")]
    Q3,
    #[serde(rename = "Q4")]
    Q4,
    /// Ranked in the category but no quartile reported
    #[serde(rename = "-")]
    Unranked,
}

impl Quartile {
    /// All quartiles from strictest to loosest
    pub const RANKED: [Quartile; 4] = [Quartile::Q1, Quartile::Q2, Quartile::Q3, Quartile::Q4];

    /// Stored and displayed token
    pub fn as_str(&self) -> &'static str {
        match self {
            Quartile::Q1 => "Q1",
            Quartile::Q2 => "Q2",
            Quartile::Q3 => "Q3",
            Quartile::Q4 => "Q4",
            Quartile::Unranked => "-",
        }
    }

    /// Numeric rank, 1 being strictest; `None` when unranked
    pub fn rank(&self) -> Option<u8> {
        match self {
            Quartile::Q1 => Some(1),
            Quartile::Q2 => Some(2),
            Quartile::Q3 => Some(3),
            Quartile::Q4 => Some(4),
            Quartile::Unranked => None,
        }
    }

    /// Quartiles that satisfy an "at least `self`" threshold.
    ///
    /// Unranked (`-`) associations never qualify, whatever the threshold,
    /// and an `Unranked` threshold selects nothing here (no quartile filter).
    pub fn at_least(&self) -> Vec<Quartile> {
        match self.rank() {
            Some(max) => Self::RANKED
                .iter()
                .copied()
                .filter(|q| q.rank().is_some_and(|r| r <= max))
                .collect(),
            None => Vec::new(),
        }
    }
}

impl std::fmt::Display for Quartile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Quartile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "Q1" => Ok(Quartile::Q1),
            "Q2" => Ok(Quartile::Q2),
            "Q3" => Ok(Quartile::Q3),
            "Q4" => Ok(Quartile::Q4),
            "-" => Ok(Quartile::Unranked),
            _ => Err(Error::InvalidQuartile(s.to_string())),
        }
    }
}

/// A journal's membership in one subject category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTag {
    pub label: String,
    pub quartile: Quartile,
}

impl CategoryTag {
    pub fn new(label: &str, quartile: Quartile) -> Self {
        Self {
            label: label.to_string(),
            quartile,
        }
    }
}

impl std::fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.label, self.quartile)
    }
}

/// Scalar journal attributes as published by the feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalInfo {
    pub source_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub journal_type: String,
    /// Natural key across import runs
    pub issn: String,
    pub sjr: f64,
    pub h_index: i64,
    pub last_year_docs: i64,
    pub three_years_docs: i64,
    pub refs: i64,
    pub cites: i64,
    pub citable_docs: i64,
    pub cites_per_doc: f64,
    pub refs_per_doc: f64,
    pub country: String,
    pub region: String,
    pub publisher: String,
}

/// A stored journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    /// Store-assigned identifier
    pub id: i64,
    #[serde(flatten)]
    pub info: JournalInfo,
    /// Set only by impact-factor enrichment
    pub impact_factor: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quartile_parsing() {
        assert_eq!("Q1".parse::<Quartile>().unwrap(), Quartile::Q1);
        assert_eq!("q3".parse::<Quartile>().unwrap(), Quartile::Q3);
        assert_eq!("-".parse::<Quartile>().unwrap(), Quartile::Unranked);
        assert!("Q5".parse::<Quartile>().is_err());
    }

    #[test]
    fn test_at_least_never_admits_unranked() {
        assert_eq!(Quartile::Q1.at_least(), vec![Quartile::Q1]);
        assert_eq!(
            Quartile::Q3.at_least(),
            vec![Quartile::Q1, Quartile::Q2, Quartile::Q3]
        );
        assert!(!Quartile::Q4.at_least().contains(&Quartile::Unranked));
        assert!(Quartile::Unranked.at_least().is_empty());
    }

    #[test]
    fn test_category_tag_display() {
        assert_eq!(CategoryTag::new("Oncology", Quartile::Q2).to_string(), "Oncology(Q2)");
        assert_eq!(
            CategoryTag::new("History", Quartile::Unranked).to_string(),
            "History(-)"
        );
    }
}
