//! SCImago feed ingestion
//!
//! This module turns one published CSV snapshot into store state:
//! - Downloading the feed (`fetch`)
//! - Decoding records and normalizing composite fields (`reader`)
//! - Reconciling records against the store (`importer`)
//! - Merging externally sourced impact factors (`impact`)

mod fetch;
mod impact;
mod importer;
mod reader;

pub use fetch::{save_download, FeedFetcher};
pub use impact::{import_impact_factors, ImpactReport};
pub use importer::{ImportReport, Importer};
pub use reader::{FeedReader, COLUMNS};

use crate::error::{Error, Result};
use crate::model::{CategoryTag, JournalInfo, Quartile};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Trailing parenthesized quartile token on a category piece
static QUARTILE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)\((Q[1-4])\)$").expect("valid regex"));

/// One decoded feed row
#[derive(Debug, Clone, PartialEq)]
pub struct JournalRecord {
    /// Line in the source file, for error reporting
    pub line: u64,
    pub info: JournalInfo,
    pub categories: Vec<CategoryTag>,
    pub areas: Vec<String>,
}

/// How association rows are replaced during an import run
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ReconcileMode {
    /// Replace each journal's associations the first time the run links it.
    /// Later rows with the same ISSN add to them. Journals absent from the
    /// feed keep their tags.
    #[default]
    PerJournal,
    /// Clear every association once at the start of the run.
    /// Journals absent from the feed lose their tags.
    Snapshot,
}

impl std::fmt::Display for ReconcileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileMode::PerJournal => write!(f, "per-journal"),
            ReconcileMode::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// Parse a real-valued cell: decimal commas become points, blank is 0.0
pub fn parse_real(value: &str, line: u64, column: &str) -> Result<f64> {
    let normalized = value.trim().replace(',', ".");
    if normalized.is_empty() {
        return Ok(0.0);
    }
    normalized.parse::<f64>().map_err(|_| Error::InvalidNumber {
        line,
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Parse an integer cell, blank is 0
pub fn parse_integer(value: &str, line: u64, column: &str) -> Result<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse::<i64>().map_err(|_| Error::InvalidNumber {
        line,
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Split one category piece into label and quartile.
///
/// `"Computer Science (Q1)"` gives `("Computer Science", Q1)`; a piece without
/// a trailing `(Q1)`..`(Q4)` token is all label with quartile `-`. Returns
/// `None` for blank pieces.
pub fn parse_category(piece: &str) -> Option<CategoryTag> {
    let piece = piece.trim();

    let tag = match QUARTILE_SUFFIX.captures(piece) {
        Some(caps) => {
            let label = caps.get(1).map_or("", |m| m.as_str()).trim();
            let quartile = match &caps[2] {
                "Q1" => Quartile::Q1,
                "Q2" => Quartile::Q2,
                "Q3" => Quartile::Q3,
                _ => Quartile::Q4,
            };
            CategoryTag::new(label, quartile)
        }
        None => CategoryTag::new(piece, Quartile::Unranked),
    };

    if tag.label.is_empty() {
        None
    } else {
        Some(tag)
    }
}

/// Split the `;`-joined categories field
pub fn split_categories(field: &str) -> Vec<CategoryTag> {
    field.split(';').filter_map(parse_category).collect()
}

/// Split the `;`-joined areas field
pub fn split_areas(field: &str) -> Vec<String> {
    field
        .split(';')
        .map(str::trim)
        .filter(|area| !area.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category_with_quartile() {
        let tag = parse_category("Computer Science (Q1)").unwrap();
        assert_eq!(tag.label, "Computer Science");
        assert_eq!(tag.quartile, Quartile::Q1);
    }

    #[test]
    fn test_parse_category_without_quartile() {
        let tag = parse_category("  Mathematics ").unwrap();
        assert_eq!(tag.label, "Mathematics");
        assert_eq!(tag.quartile, Quartile::Unranked);
    }

    #[test]
    fn test_parse_category_keeps_unrelated_parentheses() {
        let tag = parse_category("Medicine (miscellaneous) (Q3)").unwrap();
        assert_eq!(tag.label, "Medicine (miscellaneous)");
        assert_eq!(tag.quartile, Quartile::Q3);

        let tag = parse_category("Medicine (miscellaneous)").unwrap();
        assert_eq!(tag.label, "Medicine (miscellaneous)");
        assert_eq!(tag.quartile, Quartile::Unranked);

        // Only Q1..Q4 are quartile tokens
        let tag = parse_category("Physics (Q5)").unwrap();
        assert_eq!(tag.label, "Physics (Q5)");
        assert_eq!(tag.quartile, Quartile::Unranked);
    }

    #[test]
    fn test_parse_category_blank() {
        assert!(parse_category("   ").is_none());
        assert!(parse_category("(Q2)").is_none());
    }

    #[test]
    fn test_split_fields() {
        let tags = split_categories("Oncology (Q1); Hematology (Q2);");
        assert_eq!(
            tags,
            vec![
                CategoryTag::new("Oncology", Quartile::Q1),
                CategoryTag::new("Hematology", Quartile::Q2),
            ]
        );
        assert!(split_categories("").is_empty());

        assert_eq!(split_areas("Medicine; Biochemistry "), vec!["Medicine", "Biochemistry"]);
        assert!(split_areas(" ").is_empty());
    }

    #[test]
    fn test_parse_real() {
        assert_eq!(parse_real("1,234", 2, "SJR").unwrap(), 1.234);
        assert_eq!(parse_real("", 2, "SJR").unwrap(), 0.0);
        assert_eq!(parse_real("0.5", 2, "SJR").unwrap(), 0.5);

        let err = parse_real("n/a", 7, "SJR").unwrap_err();
        match err {
            Error::InvalidNumber { line, column, value } => {
                assert_eq!(line, 7);
                assert_eq!(column, "SJR");
                assert_eq!(value, "n/a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer(" 42 ", 1, "H index").unwrap(), 42);
        assert_eq!(parse_integer("", 1, "H index").unwrap(), 0);
        assert!(parse_integer("4x", 1, "H index").is_err());
    }

    #[test]
    fn test_reconcile_mode_display() {
        assert_eq!(ReconcileMode::PerJournal.to_string(), "per-journal");
        assert_eq!(ReconcileMode::Snapshot.to_string(), "snapshot");
        assert_eq!(ReconcileMode::default(), ReconcileMode::PerJournal);
    }
}
