//! Reconciliation of a feed snapshot against the store

use super::{FeedReader, JournalRecord, ReconcileMode};
use crate::error::Result;
use crate::storage::{Database, Upsert};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

/// Summary of one import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Where the snapshot came from (URL or file path)
    pub source: String,
    pub mode: ReconcileMode,
    /// SHA-256 of the raw feed bytes
    pub feed_sha256: String,
    pub records: usize,
    pub inserted: usize,
    pub updated: usize,
    pub category_links: usize,
    pub area_links: usize,
    pub elapsed_ms: u64,
}

/// Imports feed snapshots into a [`Database`]
pub struct Importer<'a> {
    db: &'a Database,
    mode: ReconcileMode,
    delimiter: u8,
}

impl<'a> Importer<'a> {
    /// Create an importer with per-journal reconciliation and `;` delimiter
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            mode: ReconcileMode::default(),
            delimiter: b';',
        }
    }

    /// Set the reconciliation mode
    pub fn with_mode(mut self, mode: ReconcileMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Import a feed file from disk
    pub fn import_file(&self, path: &Path) -> Result<ImportReport> {
        let bytes = std::fs::read(path)?;
        self.import_bytes(&bytes, &path.display().to_string())
    }

    /// Import one snapshot as a single transaction.
    ///
    /// Any decode, parse or database failure rolls the whole run back.
    pub fn import_bytes(&self, bytes: &[u8], source: &str) -> Result<ImportReport> {
        let started = Instant::now();
        tracing::info!("Importing feed from {} ({} mode)", source, self.mode);

        let mut report = self.db.transaction(|db| {
            let mut report = ImportReport {
                source: source.to_string(),
                mode: self.mode,
                feed_sha256: hex::encode(Sha256::digest(bytes)),
                ..Default::default()
            };

            let mut reader = FeedReader::new(bytes, self.delimiter)?;

            if self.mode == ReconcileMode::Snapshot {
                let cleared = db.clear_all_links()?;
                tracing::debug!("Cleared {} association rows", cleared);
            }

            // Journals whose links were already replaced in this run
            let mut cleared = HashSet::new();
            for record in reader.records() {
                self.reconcile(db, &record?, &mut cleared, &mut report)?;
            }

            db.record_import(&report)?;
            Ok(report)
        })?;

        report.elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            "Imported {} records ({} new, {} updated) in {} ms",
            report.records,
            report.inserted,
            report.updated,
            report.elapsed_ms
        );

        Ok(report)
    }

    fn reconcile(
        &self,
        db: &Database,
        record: &JournalRecord,
        cleared: &mut HashSet<i64>,
        report: &mut ImportReport,
    ) -> Result<()> {
        let journal_id = match db.upsert_journal(&record.info)? {
            Upsert::Inserted(id) => {
                report.inserted += 1;
                id
            }
            Upsert::Updated(id) => {
                report.updated += 1;
                id
            }
        };

        // Rows sharing an ISSN accumulate their links
        if self.mode == ReconcileMode::PerJournal && cleared.insert(journal_id) {
            db.clear_journal_links(journal_id)?;
        }

        for tag in &record.categories {
            db.ensure_category(&tag.label)?;
            db.link_category(journal_id, &tag.label, tag.quartile)?;
            report.category_links += 1;
        }

        for area in &record.areas {
            db.ensure_area(area)?;
            db.link_area(journal_id, area)?;
            report.area_links += 1;
        }

        report.records += 1;
        tracing::trace!("Reconciled line {} as journal {}", record.line, journal_id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const HEADER: &str = "Sourceid;Title;Type;Issn;SJR;H index;Total Docs. (2022);Total Docs. (3years);Total Refs.;Total Cites (3years);Citable Docs. (3years);Cites / Doc. (2years);Ref. / Doc.;Country;Region;Publisher;Categories;Areas";

    /// (issn, title, sjr, categories, areas)
    fn feed(rows: &[(&str, &str, &str, &str, &str)]) -> String {
        let mut out = format!("{HEADER}\n");
        for (issn, title, sjr, categories, areas) in rows {
            out.push_str(&format!(
                "1;\"{title}\";journal;\"{issn}\";{sjr};10;5;15;100;200;14;1,5;7,1;France;Western Europe;Elsevier;\"{categories}\";\"{areas}\"\n"
            ));
        }
        out
    }

    /// Full store contents in a comparable form
    fn dump(db: &Database) -> (Vec<String>, Vec<String>, Vec<String>) {
        let collect = |sql: &str| -> Vec<String> {
            let mut stmt = db.conn().prepare(sql).unwrap();
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .unwrap()
                .collect::<rusqlite::Result<Vec<_>>>()
                .unwrap();
            rows
        };
        (
            collect("SELECT id || '|' || issn || '|' || title || '|' || sjr FROM journals ORDER BY id"),
            collect("SELECT journal_id || '|' || category || '|' || quartile FROM journals_categories ORDER BY 1"),
            collect("SELECT journal_id || '|' || area FROM journals_areas ORDER BY 1"),
        )
    }

    fn category_links(db: &Database, issn: &str) -> Vec<String> {
        let mut stmt = db
            .conn()
            .prepare(
                "SELECT jc.category || '(' || jc.quartile || ')' FROM journals_categories jc \
                 JOIN journals j ON j.id = jc.journal_id WHERE j.issn = ?1 ORDER BY jc.category",
            )
            .unwrap();
        let rows = stmt
            .query_map([issn], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap();
        rows
    }

    #[test]
    fn test_import_creates_entities() {
        let db = Database::open_in_memory().unwrap();
        let data = feed(&[
            ("111", "Alpha", "1,234", "Computer Science (Q1); Mathematics", "Computer Science; Mathematics"),
            ("222", "Beta", "", "Computer Science (Q3)", "Computer Science"),
        ]);

        let report = Importer::new(&db).import_bytes(data.as_bytes(), "test").unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.updated, 0);
        assert_eq!(report.category_links, 3);
        assert_eq!(report.area_links, 3);

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.journals, 2);
        assert_eq!(stats.categories, 2);
        assert_eq!(stats.areas, 2);

        let id = db.find_journal_by_issn("111").unwrap().unwrap();
        let alpha = db.get_journal(id).unwrap().unwrap();
        assert_eq!(alpha.info.sjr, 1.234);
        assert_eq!(alpha.info.cites_per_doc, 1.5);
        assert_eq!(alpha.impact_factor, None);

        let id = db.find_journal_by_issn("222").unwrap().unwrap();
        assert_eq!(db.get_journal(id).unwrap().unwrap().info.sjr, 0.0);

        assert_eq!(
            category_links(&db, "111"),
            vec!["Computer Science(Q1)", "Mathematics(-)"]
        );

        let state = db.get_import_state().unwrap().unwrap();
        assert_eq!(state.records, 2);
        assert_eq!(state.source, "test");
        assert_eq!(state.feed_sha256, report.feed_sha256);
    }

    #[test]
    fn test_import_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let data = feed(&[
            ("111", "Alpha", "2,5", "Oncology (Q1); Hematology (Q2)", "Medicine"),
            ("222", "Beta", "0,3", "History", "Arts and Humanities"),
        ]);

        Importer::new(&db).import_bytes(data.as_bytes(), "a").unwrap();
        let once = dump(&db);

        let report = Importer::new(&db).import_bytes(data.as_bytes(), "a").unwrap();
        assert_eq!(report.inserted, 0);
        assert_eq!(report.updated, 2);
        assert_eq!(dump(&db), once);
    }

    #[test]
    fn test_reimport_updates_in_place() {
        let db = Database::open_in_memory().unwrap();
        Importer::new(&db)
            .import_bytes(feed(&[("X", "Old Name", "1", "Biology (Q2)", "Life")]).as_bytes(), "a")
            .unwrap();
        let id = db.find_journal_by_issn("X").unwrap().unwrap();

        Importer::new(&db)
            .import_bytes(feed(&[("X", "New Name", "1", "Biology (Q1)", "Life")]).as_bytes(), "b")
            .unwrap();

        assert_eq!(db.find_journal_by_issn("X").unwrap(), Some(id));
        assert_eq!(db.get_journal(id).unwrap().unwrap().info.title, "New Name");
        assert_eq!(db.get_stats().unwrap().journals, 1);
        assert_eq!(category_links(&db, "X"), vec!["Biology(Q1)"]);
    }

    #[test]
    fn test_dropped_category_is_removed() {
        let db = Database::open_in_memory().unwrap();
        Importer::new(&db)
            .import_bytes(feed(&[("X", "A", "1", "Biology (Q1); Chemistry (Q2)", "Life")]).as_bytes(), "a")
            .unwrap();
        Importer::new(&db)
            .import_bytes(feed(&[("X", "A", "1", "Biology (Q1)", "Life")]).as_bytes(), "b")
            .unwrap();

        assert_eq!(category_links(&db, "X"), vec!["Biology(Q1)"]);
        // Orphaned labels persist
        assert_eq!(db.get_stats().unwrap().categories, 2);
    }

    #[test]
    fn test_per_journal_mode_keeps_absent_journal_tags() {
        let db = Database::open_in_memory().unwrap();
        let first = feed(&[
            ("X", "A", "1", "Biology (Q1)", "Life"),
            ("Y", "B", "1", "Physics (Q2)", "Physical Sciences"),
        ]);
        let second = feed(&[("X", "A", "1", "Biology (Q2)", "Life")]);

        Importer::new(&db).import_bytes(first.as_bytes(), "a").unwrap();
        Importer::new(&db)
            .with_mode(ReconcileMode::PerJournal)
            .import_bytes(second.as_bytes(), "b")
            .unwrap();

        assert_eq!(category_links(&db, "Y"), vec!["Physics(Q2)"]);
        assert_eq!(category_links(&db, "X"), vec!["Biology(Q2)"]);
    }

    #[test]
    fn test_snapshot_mode_clears_absent_journal_tags() {
        let db = Database::open_in_memory().unwrap();
        let first = feed(&[
            ("X", "A", "1", "Biology (Q1)", "Life"),
            ("Y", "B", "1", "Physics (Q2)", "Physical Sciences"),
        ]);
        let second = feed(&[("X", "A", "1", "Biology (Q2)", "Life")]);

        Importer::new(&db).import_bytes(first.as_bytes(), "a").unwrap();
        let report = Importer::new(&db)
            .with_mode(ReconcileMode::Snapshot)
            .import_bytes(second.as_bytes(), "b")
            .unwrap();
        assert_eq!(report.mode, ReconcileMode::Snapshot);

        assert!(category_links(&db, "Y").is_empty());
        assert_eq!(category_links(&db, "X"), vec!["Biology(Q2)"]);
        // Scalar row of the absent journal stays
        assert_eq!(db.get_stats().unwrap().journals, 2);
    }

    #[test]
    fn test_shared_issn_rows_keep_every_link() {
        let data = feed(&[
            ("-", "Untitled Proceedings A", "1", "Biology (Q1)", "Life"),
            ("-", "Untitled Proceedings B", "1", "Physics (Q2)", "Physical Sciences"),
        ]);

        for mode in [ReconcileMode::PerJournal, ReconcileMode::Snapshot] {
            let db = Database::open_in_memory().unwrap();
            // A stale link from an earlier run is still replaced
            Importer::new(&db)
                .import_bytes(feed(&[("-", "Old", "1", "Chemistry (Q3)", "Life")]).as_bytes(), "a")
                .unwrap();

            let report = Importer::new(&db)
                .with_mode(mode)
                .import_bytes(data.as_bytes(), "b")
                .unwrap();
            assert_eq!(report.records, 2);
            assert_eq!(report.updated, 2);

            assert_eq!(
                category_links(&db, "-"),
                vec!["Biology(Q1)", "Physics(Q2)"],
                "{mode} mode"
            );
        }
    }

    #[test]
    fn test_failed_run_leaves_store_untouched() {
        let db = Database::open_in_memory().unwrap();
        Importer::new(&db)
            .import_bytes(feed(&[("X", "A", "1", "Biology (Q1)", "Life")]).as_bytes(), "good")
            .unwrap();
        let before = dump(&db);

        let bad = feed(&[
            ("X", "Renamed", "2", "Chemistry (Q4)", "Physical Sciences"),
            ("Z", "C", "not-a-number", "Biology", "Life"),
        ]);

        for mode in [ReconcileMode::PerJournal, ReconcileMode::Snapshot] {
            let err = Importer::new(&db)
                .with_mode(mode)
                .import_bytes(bad.as_bytes(), "bad")
                .unwrap_err();
            assert!(matches!(err, Error::InvalidNumber { line: 3, .. }));
            assert_eq!(dump(&db), before);
        }

        assert_eq!(db.get_import_state().unwrap().unwrap().source, "good");
    }

    #[test]
    fn test_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journalrank.csv");
        std::fs::write(&path, feed(&[("X", "A", "1", "Biology (Q1)", "Life")])).unwrap();

        let db = Database::open_in_memory().unwrap();
        let report = Importer::new(&db).import_file(&path).unwrap();
        assert_eq!(report.records, 1);
        assert!(report.source.ends_with("journalrank.csv"));
    }
}
