//! scimagojr - SCImago journal rankings in a local SQLite database
//!
//! This library imports the published journal-rank CSV feed into a
//! relational store and provides listing, filtered search, detail
//! inspection and CSV export over it.

pub mod cli;
pub mod error;
pub mod export;
pub mod feed;
pub mod model;
pub mod query;
pub mod storage;
pub mod tui;
pub mod workspace;

/// Re-export commonly used types
pub use error::{Error, Result};
pub use feed::{ImportReport, Importer, ReconcileMode};
pub use model::{CategoryTag, Journal, JournalInfo, Quartile};
pub use query::{QueryService, SearchFilter, SearchOutcome};
pub use storage::Database;
pub use workspace::{AppConfig, Workspace};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "scimagojr";
