//! CSV decoding of the journal-rank feed

use super::{parse_integer, parse_real, split_areas, split_categories, JournalRecord};
use crate::error::{Error, Result};
use crate::model::JournalInfo;
use regex::Regex;
use std::io::Read;
use std::sync::LazyLock;

/// Required feed headers, in publication order
pub const COLUMNS: [&str; 18] = [
    "Sourceid",
    "Title",
    "Type",
    "Issn",
    "SJR",
    "H index",
    "Total Docs. (2022)",
    "Total Docs. (3years)",
    "Total Refs.",
    "Total Cites (3years)",
    "Citable Docs. (3years)",
    "Cites / Doc. (2years)",
    "Ref. / Doc.",
    "Country",
    "Region",
    "Publisher",
    "Categories",
    "Areas",
];

/// Position of the single-year document count in [`COLUMNS`]
const LAST_YEAR_DOCS: usize = 6;

/// Later editions rename the single-year column after their year
static YEAR_DOCS_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Total Docs\. \(\d{4}\)$").expect("valid regex"));

/// Streaming reader over a semicolon-delimited feed
pub struct FeedReader<R: Read> {
    reader: csv::Reader<R>,
    /// Index of each entry of [`COLUMNS`] in the file
    positions: [usize; COLUMNS.len()],
}

impl<R: Read> FeedReader<R> {
    /// Wrap `input` and validate its header row
    pub fn new(input: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(input);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut positions = [0usize; COLUMNS.len()];
        for (i, column) in COLUMNS.iter().enumerate() {
            let found = headers.iter().position(|h| h == column).or_else(|| {
                if i == LAST_YEAR_DOCS {
                    headers.iter().position(|h| YEAR_DOCS_HEADER.is_match(h))
                } else {
                    None
                }
            });
            positions[i] = found.ok_or_else(|| Error::MissingColumn(column.to_string()))?;
        }

        Ok(Self { reader, positions })
    }

    /// Iterate over decoded records; the first error ends the run
    pub fn records(&mut self) -> impl Iterator<Item = Result<JournalRecord>> + '_ {
        let positions = self.positions;
        self.reader.records().map(move |row| {
            let row = row?;
            decode(&row, &positions)
        })
    }
}

fn decode(row: &csv::StringRecord, positions: &[usize; COLUMNS.len()]) -> Result<JournalRecord> {
    let line = row.position().map_or(0, |p| p.line());
    let cell = |i: usize| row.get(positions[i]).unwrap_or("").trim();
    let real = |i: usize| parse_real(cell(i), line, COLUMNS[i]);
    let integer = |i: usize| parse_integer(cell(i), line, COLUMNS[i]);

    let info = JournalInfo {
        source_id: cell(0).to_string(),
        title: cell(1).to_string(),
        journal_type: cell(2).to_string(),
        issn: cell(3).to_string(),
        sjr: real(4)?,
        h_index: integer(5)?,
        last_year_docs: integer(6)?,
        three_years_docs: integer(7)?,
        refs: integer(8)?,
        cites: integer(9)?,
        citable_docs: integer(10)?,
        cites_per_doc: real(11)?,
        refs_per_doc: real(12)?,
        country: cell(13).to_string(),
        region: cell(14).to_string(),
        publisher: cell(15).to_string(),
    };

    Ok(JournalRecord {
        line,
        info,
        categories: split_categories(cell(16)),
        areas: split_areas(cell(17)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryTag, Quartile};

    const HEADER: &str = "Rank;Sourceid;Title;Type;Issn;SJR;SJR Best Quartile;H index;Total Docs. (2022);Total Docs. (3years);Total Refs.;Total Cites (3years);Citable Docs. (3years);Cites / Doc. (2years);Ref. / Doc.;Country;Region;Publisher;Coverage;Categories;Areas";

    #[test]
    fn test_decode_record() {
        let feed = format!(
            "{HEADER}\n1;28773;\"Ca-A Cancer Journal for Clinicians\";journal;\"15424863, 00079235\";86,091;Q1;168;47;119;3452;15499;80;62,937;73,45;United States;Northern America;\"Wiley-Blackwell\";1950-2022;\"Hematology (Q1); Oncology (Q1)\";Medicine\n"
        );

        let mut reader = FeedReader::new(feed.as_bytes(), b';').unwrap();
        let records: Vec<_> = reader.records().collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.line, 2);
        assert_eq!(record.info.source_id, "28773");
        assert_eq!(record.info.issn, "15424863, 00079235");
        assert_eq!(record.info.sjr, 86.091);
        assert_eq!(record.info.h_index, 168);
        assert_eq!(record.info.last_year_docs, 47);
        assert_eq!(record.info.cites_per_doc, 62.937);
        assert_eq!(record.info.publisher, "Wiley-Blackwell");
        assert_eq!(
            record.categories,
            vec![
                CategoryTag::new("Hematology", Quartile::Q1),
                CategoryTag::new("Oncology", Quartile::Q1),
            ]
        );
        assert_eq!(record.areas, vec!["Medicine"]);
    }

    #[test]
    fn test_missing_column() {
        let feed = "Sourceid;Title\n1;Nature\n";
        match FeedReader::new(feed.as_bytes(), b';') {
            Err(Error::MissingColumn(column)) => assert_eq!(column, "Type"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected a missing column error"),
        }
    }

    #[test]
    fn test_accepts_later_edition_year_header() {
        let header = HEADER.replace("Total Docs. (2022)", "Total Docs. (2023)");
        let feed = format!(
            "{header}\n1;1;Nature;journal;1;;Q1;10;5;6;7;8;9;1;2;UK;Western Europe;Springer;;Biology;Life\n"
        );

        let mut reader = FeedReader::new(feed.as_bytes(), b';').unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.info.last_year_docs, 5);
        assert_eq!(record.info.sjr, 0.0);
    }

    #[test]
    fn test_malformed_number_is_fatal() {
        let feed = format!(
            "{HEADER}\n1;1;Nature;journal;1;oops;Q1;10;5;6;7;8;9;1;2;UK;Western Europe;Springer;;Biology;Life\n"
        );

        let mut reader = FeedReader::new(feed.as_bytes(), b';').unwrap();
        let err = reader.records().next().unwrap().unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { line: 2, .. }));
    }
}
