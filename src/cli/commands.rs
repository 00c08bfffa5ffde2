//! Command implementations

use super::{ConfigArgs, ExportArgs, ImpactArgs, ImportArgs, OutputFormat};
use crate::export::export_journals;
use crate::feed::ImportReport;
use crate::model::Quartile;
use crate::query::{JournalDetail, JournalSummary, QueryService, SearchFilter, SearchOutcome};
use crate::storage::Database;
use crate::workspace::{parse_delimiter, AppConfig, Workspace};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Open the workspace database, refusing to create one implicitly
pub fn open_database(workspace: &Workspace) -> Result<Database> {
    if !workspace.is_initialized() {
        anyhow::bail!("scimagojr not initialized. Run 'scimagojr init' first.");
    }
    workspace.open_database()
}

/// Query service honoring the configured result cap
pub fn query_service<'a>(workspace: &Workspace, db: &'a Database) -> QueryService<'a> {
    QueryService::new(db).with_cap(workspace.config().search.max_results)
}

/// Initialize the data directory
pub fn init(data_dir: Option<&Path>, force: bool) -> Result<()> {
    let workspace = Workspace::init(data_dir, force)?;

    println!("✓ Initialized scimagojr in {:?}", workspace.root());
    println!("  Database: {:?}", workspace.db_path());
    println!("  Config: {:?}", workspace.config_path());

    Ok(())
}

/// Run one import
pub fn import(workspace: &Workspace, args: &ImportArgs, format: OutputFormat) -> Result<ImportReport> {
    open_database(workspace)?;

    if args.file.is_none() && format == OutputFormat::Text {
        let url = args.url.as_deref().unwrap_or(&workspace.config().feed.url);
        println!("Downloading {}...", url);
    }

    let report = workspace.import_feed(args.file.as_deref(), args.url.as_deref(), args.mode)?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!("✓ Import complete ({} mode)", report.mode);
            println!("  Source: {}", report.source);
            println!("  Records: {}", report.records);
            println!("  Inserted: {}", report.inserted);
            println!("  Updated: {}", report.updated);
            println!("  Category links: {}", report.category_links);
            println!("  Area links: {}", report.area_links);
            println!("  Elapsed: {} ms", report.elapsed_ms);
        }
    }

    Ok(report)
}

/// List every journal
pub fn list(workspace: &Workspace, format: OutputFormat) -> Result<()> {
    let db = open_database(workspace)?;
    let journals = QueryService::new(&db).list_all()?;

    match format {
        OutputFormat::Json => print_json(&journals)?,
        OutputFormat::Text => print_summaries(&journals),
    }

    Ok(())
}

/// Run a search and print the matches
pub fn search(workspace: &Workspace, filter: &SearchFilter, format: OutputFormat) -> Result<()> {
    let db = open_database(workspace)?;
    let outcome = query_service(workspace, &db).search(filter)?;

    if format == OutputFormat::Json {
        return print_json(&outcome);
    }

    match outcome {
        SearchOutcome::Matches(journals) if journals.is_empty() => {
            println!("No journals match.");
        }
        SearchOutcome::Matches(journals) => {
            println!("{} journal(s)\n", journals.len());
            for journal in &journals {
                let impact = journal
                    .impact_factor
                    .map(|f| format!("  IF {:.3}", f))
                    .unwrap_or_default();
                println!(
                    "{:>6}  {}  (SJR {:.3}{})",
                    journal.id, journal.info.title, journal.info.sjr, impact
                );
            }
        }
        SearchOutcome::TooMany { count, cap } => {
            println!(
                "⚠ {} journals match, more than the limit of {}. Refine the search.",
                count, cap
            );
        }
    }

    Ok(())
}

/// Show one journal
pub fn show(workspace: &Workspace, id: i64, format: OutputFormat) -> Result<()> {
    let db = open_database(workspace)?;
    let detail = QueryService::new(&db).detail(id)?;

    match format {
        OutputFormat::Json => print_json(&detail)?,
        OutputFormat::Text => print_detail(&detail),
    }

    Ok(())
}

/// Export a search result or an explicit list of journals
pub fn export(workspace: &Workspace, args: ExportArgs) -> Result<usize> {
    let db = open_database(workspace)?;
    let query = query_service(workspace, &db);

    let ids = if args.ids.is_empty() {
        let filter = SearchFilter::from(args.filter);
        match query.search(&filter)? {
            SearchOutcome::Matches(journals) => journals.iter().map(|j| j.id).collect(),
            SearchOutcome::TooMany { count, cap } => anyhow::bail!(
                "{} journals match, more than the limit of {}. Refine the search.",
                count,
                cap
            ),
        }
    } else {
        args.ids
    };

    let written = export_journals(&query, &ids, &args.output)
        .with_context(|| format!("Failed to export to {:?}", args.output))?;

    println!("✓ Exported {} journal(s) to {:?}", written, args.output);
    Ok(written)
}

/// Merge impact factors
pub fn impact(workspace: &Workspace, args: &ImpactArgs, format: OutputFormat) -> Result<()> {
    open_database(workspace)?;
    let delimiter = parse_delimiter(&args.delimiter)?;
    let report = workspace.import_impact(&args.file, delimiter)?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            println!("✓ Impact factors imported");
            println!("  Rows: {}", report.rows);
            println!("  Matched: {}", report.matched);
            println!("  Unmatched: {}", report.unmatched);
            println!("  Skipped: {}", report.skipped);
        }
    }

    Ok(())
}

/// Print the values available for filtering
pub fn facets(workspace: &Workspace, format: OutputFormat) -> Result<()> {
    let db = open_database(workspace)?;
    let facets = QueryService::new(&db).facets()?;

    if format == OutputFormat::Json {
        return print_json(&facets);
    }

    for (name, values) in [
        ("Types", &facets.types),
        ("Countries", &facets.countries),
        ("Regions", &facets.regions),
        ("Areas", &facets.areas),
        ("Categories", &facets.categories),
    ] {
        println!("{} ({}):", name, values.len());
        for value in values {
            println!("  - {}", value);
        }
        println!();
    }

    Ok(())
}

#[derive(Serialize)]
struct StatusReport<'a> {
    data_dir: &'a Path,
    stats: crate::storage::DatabaseStats,
    last_import: Option<crate::storage::ImportState>,
}

/// Show database statistics and the last import
pub fn status(workspace: &Workspace, format: OutputFormat) -> Result<()> {
    let db = open_database(workspace)?;
    let report = StatusReport {
        data_dir: workspace.root(),
        stats: db.get_stats()?,
        last_import: db.get_import_state()?,
    };

    if format == OutputFormat::Json {
        return print_json(&report);
    }

    println!("scimagojr Status");
    println!("================\n");

    println!("Data directory: {:?}", report.data_dir);
    println!("Journals: {}", report.stats.journals);
    println!("Categories: {}", report.stats.categories);
    println!("Areas: {}", report.stats.areas);
    println!("Category links: {}", report.stats.category_links);
    println!("Area links: {}", report.stats.area_links);

    match report.last_import {
        Some(state) => {
            println!("\nLast import:");
            println!("  At: {}", state.imported_at.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("  Source: {}", state.source);
            println!("  Mode: {}", state.mode);
            println!("  Records: {} ({} new, {} updated)", state.records, state.inserted, state.updated);
            println!("  SHA-256: {}", state.feed_sha256);
        }
        None => println!("\nNo import yet. Run 'scimagojr import'."),
    }

    Ok(())
}

/// Show or change configuration
pub fn config(workspace: &mut Workspace, args: &ConfigArgs) -> Result<()> {
    if args.reset {
        *workspace.config_mut() = AppConfig::default();
        workspace.save_config()?;
        println!("✓ Configuration reset to defaults");
    }

    if let Some(ref assignment) = args.set {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Expected key=value, got {:?}", assignment))?;
        workspace.config_mut().set(key.trim(), value.trim())?;
        workspace.save_config()?;
        println!("✓ {} = {}", key.trim(), value.trim());
    }

    if let Some(ref key) = args.get {
        match workspace.config().get(key) {
            Some(value) => println!("{}", value),
            None => anyhow::bail!("Unknown config key: {}", key),
        }
    }

    if args.show || (!args.reset && args.set.is_none() && args.get.is_none()) {
        println!("# {:?}", workspace.config_path());
        let content =
            toml::to_string_pretty(workspace.config()).context("Failed to serialize configuration")?;
        print!("{}", content);
    }

    Ok(())
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// First two labels, then a count of the rest: `"A, B (+3 categories)"`
pub fn abbreviate(labels: &[String], noun: &str) -> String {
    if labels.len() > 2 {
        format!("{} (+{} {})", labels[..2].join(", "), labels.len() - 2, noun)
    } else {
        labels.join(", ")
    }
}

fn print_summaries(journals: &[JournalSummary]) {
    if journals.is_empty() {
        println!("No journals. Run 'scimagojr import' first.");
        return;
    }

    for journal in journals {
        println!("{:>6}  {}", journal.id, journal.title);
        println!("        Categories: {}", abbreviate(&journal.categories, "categories"));
        println!("        Domains: {}", abbreviate(&journal.areas, "domains"));
    }
}

/// Text marker for a quartile
pub fn quartile_icon(quartile: Quartile) -> &'static str {
    match quartile {
        Quartile::Q1 => "🔵",
        Quartile::Q2 => "🟢",
        Quartile::Q3 => "🟠",
        Quartile::Q4 => "🔴",
        Quartile::Unranked => "⚪",
    }
}

fn print_detail(detail: &JournalDetail) {
    let j = &detail.journal;
    let info = &j.info;

    println!("{}", info.title);
    println!("{}\n", "=".repeat(info.title.chars().count()));

    println!("ID: {}", j.id);
    println!("Source ID: {}", info.source_id);
    println!("Type: {}", info.journal_type);
    println!("ISSN: {}", info.issn);
    println!("Publisher: {}", info.publisher);
    println!("Country: {} ({})", info.country, info.region);
    println!();
    println!("SJR: {}", info.sjr);
    match j.impact_factor {
        Some(f) => println!("Impact factor: {}", f),
        None => println!("Impact factor: -"),
    }
    println!("H index: {}", info.h_index);
    println!("Docs (last year): {}", info.last_year_docs);
    println!("Docs (3 years): {}", info.three_years_docs);
    println!("References: {}", info.refs);
    println!("Cites (3 years): {}", info.cites);
    println!("Citable docs (3 years): {}", info.citable_docs);
    println!("Cites / doc (2 years): {}", info.cites_per_doc);
    println!("Refs / doc: {}", info.refs_per_doc);

    println!("\nCategories:");
    for tag in &detail.categories {
        println!("  {} {:<2} {}", quartile_icon(tag.quartile), tag.quartile, tag.label);
    }

    println!("\nAreas:");
    for area in &detail.areas {
        println!("  - {}", area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate(&[], "categories"), "");
        assert_eq!(abbreviate(&labels(&["A", "B"]), "categories"), "A, B");
        assert_eq!(
            abbreviate(&labels(&["A", "B", "C", "D"]), "domains"),
            "A, B (+2 domains)"
        );
    }

    #[test]
    fn test_uninitialized_workspace_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let workspace = Workspace::open(Some(dir.path())).unwrap();
        let err = list(&workspace, OutputFormat::Text).unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }
}
