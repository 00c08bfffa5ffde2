//! Flat CSV export of journal rows

use crate::error::Result;
use crate::query::{ExportRow, QueryService};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Header row of an export file
pub const HEADERS: [&str; 20] = [
    "ID",
    "SourceID",
    "Title",
    "Type",
    "ISSN",
    "SJR",
    "H Index",
    "Last Year Docs",
    "Three Years Docs",
    "Refs",
    "Cites",
    "Citable Docs",
    "Cites per Docs",
    "Ref per Docs",
    "Country",
    "Region",
    "Publisher",
    "IF",
    "Categories (Quartile)",
    "Areas",
];

/// Write a header row and one line per export row; returns rows written
pub fn write_csv<W: Write>(output: W, rows: &[ExportRow]) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(HEADERS)?;

    for row in rows {
        let j = &row.journal;
        let info = &j.info;
        writer.write_record([
            j.id.to_string(),
            info.source_id.clone(),
            info.title.clone(),
            info.journal_type.clone(),
            info.issn.clone(),
            info.sjr.to_string(),
            info.h_index.to_string(),
            info.last_year_docs.to_string(),
            info.three_years_docs.to_string(),
            info.refs.to_string(),
            info.cites.to_string(),
            info.citable_docs.to_string(),
            info.cites_per_doc.to_string(),
            info.refs_per_doc.to_string(),
            info.country.clone(),
            info.region.clone(),
            info.publisher.clone(),
            j.impact_factor.map(|f| f.to_string()).unwrap_or_default(),
            row.categories.clone(),
            row.areas.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(rows.len())
}

/// Export the given journals, in the given order, to a file.
///
/// Every id is resolved before the file is created, so an unknown id
/// leaves no partial output behind.
pub fn export_journals(query: &QueryService<'_>, ids: &[i64], path: &Path) -> Result<usize> {
    let rows = ids
        .iter()
        .map(|id| query.export_row(*id))
        .collect::<Result<Vec<_>>>()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let written = write_csv(File::create(path)?, &rows)?;

    tracing::info!("Exported {} journals to {:?}", written, path);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JournalInfo, Quartile};
    use crate::storage::Database;
    use tempfile::TempDir;

    fn seeded() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .upsert_journal(&JournalInfo {
                source_id: "28773".to_string(),
                title: "Ca-A Cancer Journal for Clinicians".to_string(),
                journal_type: "journal".to_string(),
                issn: "15424863, 00079235".to_string(),
                sjr: 86.091,
                h_index: 223,
                country: "United States".to_string(),
                publisher: "Wiley-Blackwell".to_string(),
                ..Default::default()
            })
            .unwrap()
            .id();
        for (label, quartile) in [("Hematology", Quartile::Q1), ("Oncology", Quartile::Unranked)] {
            db.ensure_category(label).unwrap();
            db.link_category(id, label, quartile).unwrap();
        }
        db.ensure_area("Medicine").unwrap();
        db.link_area(id, "Medicine").unwrap();
        (db, id)
    }

    #[test]
    fn test_write_csv() {
        let (db, id) = seeded();
        let row = QueryService::new(&db).export_row(id).unwrap();

        let mut out = Vec::new();
        assert_eq!(write_csv(&mut out, &[row]).unwrap(), 1);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), HEADERS.join(","));

        let line = lines.next().unwrap();
        assert!(line.starts_with(&format!("{id},28773,Ca-A Cancer Journal for Clinicians,journal,")));
        assert!(line.contains("\"15424863, 00079235\""));
        // Unknown impact factor is an empty cell
        assert!(line.ends_with(",Wiley-Blackwell,,Hematology(Q1); Oncology(-),Medicine"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_export_journals_to_file() {
        let (db, id) = seeded();
        db.set_impact_factor(id, Some(254.7)).unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("journals.csv");

        let written = export_journals(&QueryService::new(&db), &[id], &path).unwrap();
        assert_eq!(written, 1);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[17], "254.7");
        assert_eq!(&record[18], "Hematology(Q1); Oncology(-)");
    }

    #[test]
    fn test_unknown_id_writes_nothing() {
        let (db, id) = seeded();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journals.csv");

        let err = export_journals(&QueryService::new(&db), &[id, 404], &path).unwrap_err();
        assert!(err.is_not_found());
        assert!(!path.exists());
    }
}
