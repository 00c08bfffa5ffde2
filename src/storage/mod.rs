//! SQLite storage layer
//!
//! This module handles persistent storage of:
//! - Journals keyed by ISSN
//! - Category and area labels
//! - Journal/category and journal/area associations
//! - The outcome of the last import run

mod schema;

pub use schema::SCHEMA;

use crate::error::Result;
use crate::feed::ImportReport;
use crate::model::{Journal, JournalInfo, Quartile};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;

/// Column list matching [`journal_from_row`]
pub(crate) const JOURNAL_COLUMNS: &str = "j.id, j.source_id, j.title, j.type, j.issn, j.sjr, \
     j.h_index, j.last_year_docs, j.three_years_docs, j.refs, j.cites, j.citable_docs, \
     j.cites_per_doc, j.refs_per_doc, j.country, j.region, j.publisher, j.impact_factor";

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

/// Outcome of reconciling one journal by ISSN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted(i64),
    Updated(i64),
}

impl Upsert {
    /// Identifier of the affected row
    pub fn id(&self) -> i64 {
        match self {
            Upsert::Inserted(id) | Upsert::Updated(id) => *id,
        }
    }
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::debug!("Opened database at {:?}", path.as_ref());

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Initialize the database schema
    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` as one atomic unit of work.
    ///
    /// Commits when `f` returns `Ok`; the transaction is rolled back when `f`
    /// fails or panics.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    // ==================== Journals ====================

    /// Find a journal identifier by ISSN
    pub fn find_journal_by_issn(&self, issn: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .prepare_cached("SELECT id FROM journals WHERE issn = ?1")?
            .query_row(params![issn], |row| row.get(0))
            .optional()?;
        Ok(id)
    }

    /// Update the journal with this ISSN in place, or insert it.
    ///
    /// The impact factor column is never touched.
    pub fn upsert_journal(&self, info: &JournalInfo) -> Result<Upsert> {
        if let Some(id) = self.find_journal_by_issn(&info.issn)? {
            self.conn
                .prepare_cached(
                    r#"
                    UPDATE journals SET
                        source_id = ?1, title = ?2, type = ?3, sjr = ?4, h_index = ?5,
                        last_year_docs = ?6, three_years_docs = ?7, refs = ?8, cites = ?9,
                        citable_docs = ?10, cites_per_doc = ?11, refs_per_doc = ?12,
                        country = ?13, region = ?14, publisher = ?15
                    WHERE id = ?16
                    "#,
                )?
                .execute(params![
                    info.source_id,
                    info.title,
                    info.journal_type,
                    info.sjr,
                    info.h_index,
                    info.last_year_docs,
                    info.three_years_docs,
                    info.refs,
                    info.cites,
                    info.citable_docs,
                    info.cites_per_doc,
                    info.refs_per_doc,
                    info.country,
                    info.region,
                    info.publisher,
                    id,
                ])?;
            return Ok(Upsert::Updated(id));
        }

        self.conn
            .prepare_cached(
                r#"
                INSERT INTO journals (
                    source_id, title, type, issn, sjr, h_index, last_year_docs,
                    three_years_docs, refs, cites, citable_docs, cites_per_doc,
                    refs_per_doc, country, region, publisher
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                "#,
            )?
            .execute(params![
                info.source_id,
                info.title,
                info.journal_type,
                info.issn,
                info.sjr,
                info.h_index,
                info.last_year_docs,
                info.three_years_docs,
                info.refs,
                info.cites,
                info.citable_docs,
                info.cites_per_doc,
                info.refs_per_doc,
                info.country,
                info.region,
                info.publisher,
            ])?;

        Ok(Upsert::Inserted(self.conn.last_insert_rowid()))
    }

    /// Get a journal by identifier
    pub fn get_journal(&self, id: i64) -> Result<Option<Journal>> {
        let journal = self
            .conn
            .query_row(
                &format!("SELECT {JOURNAL_COLUMNS} FROM journals j WHERE j.id = ?1"),
                params![id],
                journal_from_row,
            )
            .optional()?;
        Ok(journal)
    }

    /// All journal identifiers and titles
    pub fn journal_titles(&self) -> Result<Vec<(i64, String)>> {
        let mut stmt = self.conn.prepare("SELECT id, title FROM journals ORDER BY id")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Set or clear a journal's impact factor. Returns false if no such journal.
    pub fn set_impact_factor(&self, id: i64, impact_factor: Option<f64>) -> Result<bool> {
        let count = self.conn.execute(
            "UPDATE journals SET impact_factor = ?1 WHERE id = ?2",
            params![impact_factor, id],
        )?;
        Ok(count > 0)
    }

    // ==================== Labels & Associations ====================

    /// Create the category if absent
    pub fn ensure_category(&self, label: &str) -> Result<()> {
        self.conn
            .prepare_cached("INSERT OR IGNORE INTO categories (label) VALUES (?1)")?
            .execute(params![label])?;
        Ok(())
    }

    /// Create the area if absent
    pub fn ensure_area(&self, label: &str) -> Result<()> {
        self.conn
            .prepare_cached("INSERT OR IGNORE INTO areas (label) VALUES (?1)")?
            .execute(params![label])?;
        Ok(())
    }

    /// Insert or replace a journal/category association
    pub fn link_category(&self, journal_id: i64, category: &str, quartile: Quartile) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT OR REPLACE INTO journals_categories (journal_id, category, quartile) VALUES (?1, ?2, ?3)",
            )?
            .execute(params![journal_id, category, quartile.as_str()])?;
        Ok(())
    }

    /// Insert or replace a journal/area association
    pub fn link_area(&self, journal_id: i64, area: &str) -> Result<()> {
        self.conn
            .prepare_cached("INSERT OR REPLACE INTO journals_areas (journal_id, area) VALUES (?1, ?2)")?
            .execute(params![journal_id, area])?;
        Ok(())
    }

    /// Remove every association of one journal
    pub fn clear_journal_links(&self, journal_id: i64) -> Result<()> {
        self.conn
            .prepare_cached("DELETE FROM journals_categories WHERE journal_id = ?1")?
            .execute(params![journal_id])?;
        self.conn
            .prepare_cached("DELETE FROM journals_areas WHERE journal_id = ?1")?
            .execute(params![journal_id])?;
        Ok(())
    }

    /// Remove every association of every journal
    pub fn clear_all_links(&self) -> Result<usize> {
        let categories = self.conn.execute("DELETE FROM journals_categories", [])?;
        let areas = self.conn.execute("DELETE FROM journals_areas", [])?;
        Ok(categories + areas)
    }

    // ==================== Import State ====================

    /// Get the outcome of the last import run
    pub fn get_import_state(&self) -> Result<Option<ImportState>> {
        let state = self
            .conn
            .query_row(
                r#"
                SELECT imported_at, source, mode, records, inserted, updated, feed_sha256
                FROM import_state WHERE id = 1
                "#,
                [],
                |row| {
                    let imported_at: String = row.get(0)?;
                    Ok(ImportState {
                        imported_at: DateTime::parse_from_rfc3339(&imported_at)
                            .map(|t| t.with_timezone(&Utc))
                            .unwrap_or_default(),
                        source: row.get(1)?,
                        mode: row.get(2)?,
                        records: row.get::<_, i64>(3)? as usize,
                        inserted: row.get::<_, i64>(4)? as usize,
                        updated: row.get::<_, i64>(5)? as usize,
                        feed_sha256: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(state)
    }

    /// Record the outcome of an import run
    pub fn record_import(&self, report: &ImportReport) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO import_state (
                id, imported_at, source, mode, records, inserted, updated, feed_sha256
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                Utc::now().to_rfc3339(),
                report.source,
                report.mode.to_string(),
                report.records as i64,
                report.inserted as i64,
                report.updated as i64,
                report.feed_sha256,
            ],
        )?;
        Ok(())
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(DatabaseStats {
            journals: count("journals")?,
            categories: count("categories")?,
            areas: count("areas")?,
            category_links: count("journals_categories")?,
            area_links: count("journals_areas")?,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub journals: usize,
    pub categories: usize,
    pub areas: usize,
    pub category_links: usize,
    pub area_links: usize,
}

/// Persisted summary of the last import run
#[derive(Debug, Clone, Serialize)]
pub struct ImportState {
    pub imported_at: DateTime<Utc>,
    pub source: String,
    pub mode: String,
    pub records: usize,
    pub inserted: usize,
    pub updated: usize,
    pub feed_sha256: String,
}

/// Map a row selected with [`JOURNAL_COLUMNS`]
pub(crate) fn journal_from_row(row: &Row<'_>) -> rusqlite::Result<Journal> {
    Ok(Journal {
        id: row.get(0)?,
        info: JournalInfo {
            source_id: row.get(1)?,
            title: row.get(2)?,
            journal_type: row.get(3)?,
            issn: row.get(4)?,
            sjr: row.get(5)?,
            h_index: row.get(6)?,
            last_year_docs: row.get(7)?,
            three_years_docs: row.get(8)?,
            refs: row.get(9)?,
            cites: row.get(10)?,
            citable_docs: row.get(11)?,
            cites_per_doc: row.get(12)?,
            refs_per_doc: row.get(13)?,
            country: row.get(14)?,
            region: row.get(15)?,
            publisher: row.get(16)?,
        },
        impact_factor: row.get(17)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn info(issn: &str, title: &str) -> JournalInfo {
        JournalInfo {
            source_id: "100".to_string(),
            title: title.to_string(),
            journal_type: "journal".to_string(),
            issn: issn.to_string(),
            sjr: 1.5,
            h_index: 40,
            country: "France".to_string(),
            region: "Western Europe".to_string(),
            publisher: "Elsevier".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_database_creation() {
        let db = Database::open_in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.journals, 0);
        assert_eq!(stats.category_links, 0);
        assert!(db.get_import_state().unwrap().is_none());
    }

    #[test]
    fn test_upsert_keeps_identifier() {
        let db = Database::open_in_memory().unwrap();

        let first = db.upsert_journal(&info("1234-5678", "Old Title")).unwrap();
        assert!(matches!(first, Upsert::Inserted(_)));

        let second = db.upsert_journal(&info("1234-5678", "New Title")).unwrap();
        assert_eq!(second, Upsert::Updated(first.id()));

        let journal = db.get_journal(first.id()).unwrap().unwrap();
        assert_eq!(journal.info.title, "New Title");
        assert_eq!(db.get_stats().unwrap().journals, 1);
    }

    #[test]
    fn test_upsert_preserves_impact_factor() {
        let db = Database::open_in_memory().unwrap();
        let id = db.upsert_journal(&info("1", "Nature")).unwrap().id();
        assert!(db.set_impact_factor(id, Some(42.5)).unwrap());

        db.upsert_journal(&info("1", "Nature")).unwrap();
        let journal = db.get_journal(id).unwrap().unwrap();
        assert_eq!(journal.impact_factor, Some(42.5));

        assert!(!db.set_impact_factor(999, Some(1.0)).unwrap());
    }

    #[test]
    fn test_links_replace_rather_than_duplicate() {
        let db = Database::open_in_memory().unwrap();
        let id = db.upsert_journal(&info("1", "Nature")).unwrap().id();

        db.ensure_category("Biology").unwrap();
        db.ensure_category("Biology").unwrap();
        db.link_category(id, "Biology", Quartile::Q2).unwrap();
        db.link_category(id, "Biology", Quartile::Q1).unwrap();
        db.ensure_area("Life Sciences").unwrap();
        db.link_area(id, "Life Sciences").unwrap();
        db.link_area(id, "Life Sciences").unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.categories, 1);
        assert_eq!(stats.category_links, 1);
        assert_eq!(stats.area_links, 1);

        let quartile: String = db
            .conn()
            .query_row("SELECT quartile FROM journals_categories", [], |r| r.get(0))
            .unwrap();
        assert_eq!(quartile, "Q1");

        db.clear_journal_links(id).unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.category_links, 0);
        assert_eq!(stats.area_links, 0);
        assert_eq!(stats.categories, 1);
    }

    #[test]
    fn test_link_requires_existing_label() {
        let db = Database::open_in_memory().unwrap();
        let id = db.upsert_journal(&info("1", "Nature")).unwrap().id();
        assert!(db.link_category(id, "Unknown", Quartile::Q1).is_err());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();

        let result: Result<()> = db.transaction(|db| {
            db.upsert_journal(&info("1", "Nature"))?;
            Err(Error::Config("abort".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(db.get_stats().unwrap().journals, 0);

        db.transaction(|db| db.upsert_journal(&info("1", "Nature")))
            .unwrap();
        assert_eq!(db.get_stats().unwrap().journals, 1);
    }
}
