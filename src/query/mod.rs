//! Read-only projections over the journal store
//!
//! Listing, filtered search, single-journal detail, facet values and
//! export-ready rows. Nothing here mutates the database.

mod filter;

pub use filter::SearchFilter;

use crate::error::{Error, Result};
use crate::model::{CategoryTag, Journal, Quartile};
use crate::storage::{journal_from_row, Database, JOURNAL_COLUMNS};
use rusqlite::{params, params_from_iter};
use serde::Serialize;
use std::collections::HashMap;

/// Largest result set a search may return
pub const DISPLAY_CAP: usize = 1000;

/// One line of the journal list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalSummary {
    pub id: i64,
    pub title: String,
    /// Sorted distinct category labels
    pub categories: Vec<String>,
    /// Sorted distinct area labels
    pub areas: Vec<String>,
}

impl JournalSummary {
    pub fn categories_joined(&self) -> String {
        self.categories.join(", ")
    }

    pub fn areas_joined(&self) -> String {
        self.areas.join(", ")
    }
}

/// Result of a search
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Matching journals ordered by identifier
    Matches(Vec<Journal>),
    /// Too many matches to display; nothing was fetched
    TooMany { count: usize, cap: usize },
}

/// A journal with all of its associations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalDetail {
    pub journal: Journal,
    /// In feed order
    pub categories: Vec<CategoryTag>,
    /// In feed order
    pub areas: Vec<String>,
}

/// Flattened journal for CSV export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub journal: Journal,
    /// `label(quartile)` entries joined with `"; "`
    pub categories: String,
    /// Area labels joined with `"; "`
    pub areas: String,
}

impl From<JournalDetail> for ExportRow {
    fn from(detail: JournalDetail) -> Self {
        Self {
            categories: detail
                .categories
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
            areas: detail.areas.join("; "),
            journal: detail.journal,
        }
    }
}

/// Distinct values available for filtering
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Facets {
    pub categories: Vec<String>,
    pub areas: Vec<String>,
    pub types: Vec<String>,
    pub countries: Vec<String>,
    pub regions: Vec<String>,
}

/// Query service over a borrowed store handle
pub struct QueryService<'a> {
    db: &'a Database,
    cap: usize,
}

impl<'a> QueryService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db, cap: DISPLAY_CAP }
    }

    /// Override the search display cap
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    /// Every journal with its category and area labels
    pub fn list_all(&self) -> Result<Vec<JournalSummary>> {
        let conn = self.db.conn();

        let mut categories = labels_by_journal(
            conn,
            "SELECT journal_id, category FROM journals_categories ORDER BY journal_id, category",
        )?;
        let mut areas = labels_by_journal(
            conn,
            "SELECT journal_id, area FROM journals_areas ORDER BY journal_id, area",
        )?;

        let mut stmt = conn.prepare("SELECT id, title FROM journals ORDER BY id")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, title) = row?;
            summaries.push(JournalSummary {
                id,
                title,
                categories: categories.remove(&id).unwrap_or_default(),
                areas: areas.remove(&id).unwrap_or_default(),
            });
        }

        Ok(summaries)
    }

    /// Run a filtered search, refusing result sets larger than the cap
    pub fn search(&self, filter: &SearchFilter) -> Result<SearchOutcome> {
        let conn = self.db.conn();
        let (clause, values) = filter.to_sql();
        let where_sql = if clause.is_empty() {
            String::new()
        } else {
            format!(" WHERE {clause}")
        };

        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM journals j{where_sql}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;
        let count = count as usize;

        if count > self.cap {
            tracing::warn!("Search matched {} journals, over the cap of {}", count, self.cap);
            return Ok(SearchOutcome::TooMany {
                count,
                cap: self.cap,
            });
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT {JOURNAL_COLUMNS} FROM journals j{where_sql} ORDER BY j.id"
        ))?;
        let journals = stmt
            .query_map(params_from_iter(values.iter()), journal_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        tracing::debug!("Search matched {} journals", journals.len());
        Ok(SearchOutcome::Matches(journals))
    }

    /// Full record of one journal
    pub fn detail(&self, id: i64) -> Result<JournalDetail> {
        let journal = self.db.get_journal(id)?.ok_or(Error::JournalNotFound(id))?;
        let conn = self.db.conn();

        let mut stmt = conn.prepare(
            "SELECT category, quartile FROM journals_categories WHERE journal_id = ?1 ORDER BY rowid",
        )?;
        let categories = stmt
            .query_map(params![id], |row| {
                let label: String = row.get(0)?;
                let quartile: String = row.get(1)?;
                Ok(CategoryTag {
                    label,
                    quartile: quartile.parse().unwrap_or(Quartile::Unranked),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt =
            conn.prepare("SELECT area FROM journals_areas WHERE journal_id = ?1 ORDER BY rowid")?;
        let areas = stmt
            .query_map(params![id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(JournalDetail {
            journal,
            categories,
            areas,
        })
    }

    /// Export projection of one journal
    pub fn export_row(&self, id: i64) -> Result<ExportRow> {
        Ok(self.detail(id)?.into())
    }

    /// Distinct labels and attribute values, sorted
    pub fn facets(&self) -> Result<Facets> {
        let conn = self.db.conn();
        let column = |sql: &str| -> Result<Vec<String>> {
            let mut stmt = conn.prepare(sql)?;
            let values = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(values)
        };

        Ok(Facets {
            categories: column("SELECT label FROM categories ORDER BY label")?,
            areas: column("SELECT label FROM areas ORDER BY label")?,
            types: column("SELECT DISTINCT type FROM journals WHERE type <> '' ORDER BY type")?,
            countries: column(
                "SELECT DISTINCT country FROM journals WHERE country <> '' ORDER BY country",
            )?,
            regions: column("SELECT DISTINCT region FROM journals WHERE region <> '' ORDER BY region")?,
        })
    }
}

fn labels_by_journal(conn: &rusqlite::Connection, sql: &str) -> Result<HashMap<i64, Vec<String>>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

    let mut map: HashMap<i64, Vec<String>> = HashMap::new();
    for row in rows {
        let (id, label) = row?;
        map.entry(id).or_default().push(label);
    }
    Ok(map)
}
