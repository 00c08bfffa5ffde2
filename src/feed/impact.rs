//! Impact-factor enrichment from a `Title,IF` CSV file

use super::parse_real;
use crate::error::{Error, Result};
use crate::storage::Database;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;

/// Summary of an impact-factor import
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImpactReport {
    pub rows: usize,
    /// Journals whose impact factor was set
    pub matched: usize,
    /// Rows whose title matched no journal
    pub unmatched: usize,
    /// Rows with a blank factor
    pub skipped: usize,
}

/// Set impact factors on journals whose title equals a row's title,
/// ignoring case. Runs as a single transaction.
pub fn import_impact_factors<R: Read>(db: &Database, input: R, delimiter: u8) -> Result<ImpactReport> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    let column = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
    };
    let title_col = column(&["Title"]).ok_or_else(|| Error::MissingColumn("Title".to_string()))?;
    let factor_col = column(&["IF", "Impact Factor"]).ok_or_else(|| Error::MissingColumn("IF".to_string()))?;

    let mut by_title: HashMap<String, Vec<i64>> = HashMap::new();
    for (id, title) in db.journal_titles()? {
        by_title.entry(title.trim().to_lowercase()).or_default().push(id);
    }

    db.transaction(|db| {
        let mut report = ImpactReport::default();

        for row in reader.records() {
            let row = row?;
            let line = row.position().map_or(0, |p| p.line());
            report.rows += 1;

            let raw = row.get(factor_col).unwrap_or("").trim();
            if raw.is_empty() {
                report.skipped += 1;
                continue;
            }
            let factor = parse_real(raw, line, "IF")?;

            let title = row.get(title_col).unwrap_or("").trim().to_lowercase();
            match by_title.get(&title) {
                Some(ids) => {
                    for id in ids {
                        db.set_impact_factor(*id, Some(factor))?;
                        report.matched += 1;
                    }
                }
                None => {
                    tracing::debug!("No journal titled {:?}", title);
                    report.unmatched += 1;
                }
            }
        }

        tracing::info!(
            "Impact factors: {} matched, {} unmatched, {} skipped",
            report.matched,
            report.unmatched,
            report.skipped
        );

        Ok(report)
    })
}
