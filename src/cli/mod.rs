//! CLI interface using clap
//!
//! Provides the command-line interface for scimagojr

mod commands;

pub use commands::*;

use crate::feed::ReconcileMode;
use crate::model::Quartile;
use crate::query::SearchFilter;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// scimagojr - SCImago journal rankings in a local database
#[derive(Parser, Debug)]
#[command(name = "scimagojr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory holding the database and configuration
    #[arg(short = 'D', long, global = true, env = "SCIMAGOJR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory, configuration and database
    Init(InitArgs),

    /// Download or read the ranking feed and reconcile it into the database
    Import(ImportArgs),

    /// List every journal with its categories and areas
    List,

    /// Search journals
    Search(SearchArgs),

    /// Show one journal in full
    Show(ShowArgs),

    /// Export journals to a CSV file
    Export(ExportArgs),

    /// Merge impact factors from a Title,IF CSV file
    Impact(ImpactArgs),

    /// List the values available for filtering
    Facets,

    /// Show database statistics and the last import
    Status,

    /// Show or change configuration
    Config(ConfigArgs),

    /// Launch the interactive TUI
    Tui,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Arguments for init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration with defaults
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for import command
#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// Read the feed from a local file instead of downloading it
    #[arg(short, long, conflicts_with = "url")]
    pub file: Option<PathBuf>,

    /// Download from this URL instead of the configured one
    #[arg(short, long)]
    pub url: Option<String>,

    /// How existing associations are replaced
    #[arg(short, long)]
    pub mode: Option<ReconcileMode>,
}

/// Search criteria shared by search and export
#[derive(clap::Args, Debug, Default)]
pub struct FilterArgs {
    /// Title keyword; spaces match anything
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Minimum SJR
    #[arg(long)]
    pub min_sjr: Option<f64>,

    /// Minimum impact factor
    #[arg(long = "min-if")]
    pub min_impact_factor: Option<f64>,

    /// Journal type (e.g. journal, book series)
    #[arg(short = 't', long = "type")]
    pub journal_type: Option<String>,

    /// Publisher country
    #[arg(long)]
    pub country: Option<String>,

    /// Publisher region
    #[arg(long)]
    pub region: Option<String>,

    /// Require a category ranked at this quartile or better (Q1..Q4)
    #[arg(short, long)]
    pub quartile: Option<Quartile>,

    /// Category label (repeatable)
    #[arg(short, long = "category")]
    pub categories: Vec<String>,

    /// Area label (repeatable)
    #[arg(short, long = "area")]
    pub areas: Vec<String>,
}

impl From<FilterArgs> for SearchFilter {
    fn from(args: FilterArgs) -> Self {
        SearchFilter {
            keyword: args.keyword,
            min_sjr: args.min_sjr,
            min_impact_factor: args.min_impact_factor,
            journal_type: args.journal_type,
            country: args.country,
            region: args.region,
            max_quartile: args.quartile,
            categories: args.categories,
            areas: args.areas,
        }
    }
}

/// Arguments for search command
#[derive(Parser, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Arguments for show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Journal ID
    pub id: i64,
}

/// Arguments for export command
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Destination CSV file
    #[arg(long, short = 'O')]
    pub output: PathBuf,

    /// Export these journal IDs instead of a search result
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub ids: Vec<i64>,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Arguments for impact command
#[derive(Parser, Debug)]
pub struct ImpactArgs {
    /// CSV file with Title and IF columns
    #[arg(short, long)]
    pub file: PathBuf,

    /// Field delimiter of the file
    #[arg(short, long, default_value = ",")]
    pub delimiter: String,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Show current configuration
    #[arg(long)]
    pub show: bool,

    /// Set a configuration value (key=value)
    #[arg(long)]
    pub set: Option<String>,

    /// Get a configuration value
    #[arg(long)]
    pub get: Option<String>,

    /// Reset to defaults
    #[arg(long)]
    pub reset: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
