//! Database schema definition

/// SQL schema for the journal store
pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- One row per publication venue, keyed for reconciliation by ISSN
CREATE TABLE IF NOT EXISTS journals (
    id INTEGER PRIMARY KEY,
    source_id TEXT NOT NULL,
    title TEXT NOT NULL,
    type TEXT NOT NULL,
    issn TEXT NOT NULL,
    sjr REAL NOT NULL DEFAULT 0.0,
    h_index INTEGER NOT NULL DEFAULT 0,
    last_year_docs INTEGER NOT NULL DEFAULT 0,
    three_years_docs INTEGER NOT NULL DEFAULT 0,
    refs INTEGER NOT NULL DEFAULT 0,
    cites INTEGER NOT NULL DEFAULT 0,
    citable_docs INTEGER NOT NULL DEFAULT 0,
    cites_per_doc REAL NOT NULL DEFAULT 0.0,
    refs_per_doc REAL NOT NULL DEFAULT 0.0,
    country TEXT NOT NULL,
    region TEXT NOT NULL,
    publisher TEXT NOT NULL,
    impact_factor REAL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_journals_issn ON journals(issn);
CREATE INDEX IF NOT EXISTS idx_journals_title ON journals(title);

-- Subject categories
CREATE TABLE IF NOT EXISTS categories (
    label TEXT PRIMARY KEY
);

-- Broad subject areas
CREATE TABLE IF NOT EXISTS areas (
    label TEXT PRIMARY KEY
);

-- Journal <-> category membership with the journal's quartile in that category
CREATE TABLE IF NOT EXISTS journals_categories (
    journal_id INTEGER NOT NULL,
    category TEXT NOT NULL,
    quartile TEXT NOT NULL DEFAULT '-',
    PRIMARY KEY (journal_id, category),
    FOREIGN KEY (journal_id) REFERENCES journals(id),
    FOREIGN KEY (category) REFERENCES categories(label)
);

CREATE INDEX IF NOT EXISTS idx_journals_categories_category ON journals_categories(category);

-- Journal <-> area membership
CREATE TABLE IF NOT EXISTS journals_areas (
    journal_id INTEGER NOT NULL,
    area TEXT NOT NULL,
    PRIMARY KEY (journal_id, area),
    FOREIGN KEY (journal_id) REFERENCES journals(id),
    FOREIGN KEY (area) REFERENCES areas(label)
);

CREATE INDEX IF NOT EXISTS idx_journals_areas_area ON journals_areas(area);

-- Outcome of the most recent import run
CREATE TABLE IF NOT EXISTS import_state (
    id INTEGER PRIMARY KEY,
    imported_at TEXT NOT NULL,
    source TEXT NOT NULL,
    mode TEXT NOT NULL,
    records INTEGER NOT NULL,
    inserted INTEGER NOT NULL,
    updated INTEGER NOT NULL,
    feed_sha256 TEXT NOT NULL
);
"#;
