//! Data directory layout
//!
//! A workspace is the directory holding the database, the configuration
//! file and the last raw feed download.

mod config;

pub use config::{
    parse_delimiter, AppConfig, DatabaseConfig, FeedConfig, ImportConfig, SearchConfig,
    CONFIG_FILE, DEFAULT_FEED_URL,
};

use crate::feed::{
    import_impact_factors, save_download, FeedFetcher, ImpactReport, ImportReport, Importer,
    ReconcileMode,
};
use crate::storage::Database;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "SCIMAGOJR_DATA_DIR";

/// Resolved data directory plus its configuration
pub struct Workspace {
    root: PathBuf,
    config: AppConfig,
}

impl Workspace {
    /// Open the workspace at `dir`, or at the default location
    pub fn open(dir: Option<&Path>) -> Result<Self> {
        let root = resolve_data_dir(dir);
        let config = AppConfig::load_or_default(&root)?;
        tracing::debug!("Using data directory {:?}", root);
        Ok(Self { root, config })
    }

    /// Create the data directory and write a configuration file.
    ///
    /// An existing configuration is kept unless `force` is set.
    pub fn init(dir: Option<&Path>, force: bool) -> Result<Self> {
        let root = resolve_data_dir(dir);
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create {:?}", root))?;

        let config_path = root.join(CONFIG_FILE);
        let config = if config_path.exists() && !force {
            AppConfig::load_or_default(&root)?
        } else {
            let config = AppConfig::default();
            config.save(&root)?;
            config
        };

        let workspace = Self { root, config };
        // Creates the schema
        workspace.open_database()?;
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    /// Persist the in-memory configuration
    pub fn save_config(&self) -> Result<()> {
        self.config.save(&self.root)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(&self.config.database.file)
    }

    /// Where the last downloaded feed is kept
    pub fn download_path(&self) -> PathBuf {
        self.root.join("tmp").join("journalrank.csv")
    }

    pub fn is_initialized(&self) -> bool {
        self.db_path().exists()
    }

    /// Open (creating if needed) the journal database
    pub fn open_database(&self) -> Result<Database> {
        let path = self.db_path();
        Database::open(&path).with_context(|| format!("Failed to open database at {:?}", path))
    }

    /// Run one import: read `file` if given, otherwise download from `url`
    /// or the configured feed URL. `mode` overrides the configured mode.
    pub fn import_feed(
        &self,
        file: Option<&Path>,
        url: Option<&str>,
        mode: Option<ReconcileMode>,
    ) -> Result<ImportReport> {
        let db = self.open_database()?;
        let importer = Importer::new(&db)
            .with_mode(mode.unwrap_or(self.config.import.reconcile))
            .with_delimiter(self.config.feed.delimiter_byte()?);

        if let Some(path) = file {
            return importer
                .import_file(path)
                .with_context(|| format!("Failed to import feed file {:?}", path));
        }

        let url = url.unwrap_or(&self.config.feed.url);
        let bytes = FeedFetcher::new(url, self.config.feed.timeout())
            .fetch()
            .with_context(|| format!("Failed to download feed from {}", url))?;

        if self.config.feed.keep_download {
            let path = self.download_path();
            save_download(&path, &bytes)
                .with_context(|| format!("Failed to save download to {:?}", path))?;
        }

        importer
            .import_bytes(&bytes, url)
            .with_context(|| format!("Failed to import feed from {}", url))
    }

    /// Merge impact factors from a `Title,IF` file
    pub fn import_impact(&self, path: &Path, delimiter: u8) -> Result<ImpactReport> {
        let db = self.open_database()?;
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open impact factor file {:?}", path))?;
        import_impact_factors(&db, file, delimiter)
            .with_context(|| format!("Failed to import impact factors from {:?}", path))
    }
}

/// Pick the data directory: explicit path, then environment, then the
/// platform data directory, then `./.scimagojr`
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }

    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }

    match dirs::data_dir() {
        Some(dir) => dir.join(crate::APP_NAME),
        None => PathBuf::from(format!(".{}", crate::APP_NAME)),
    }
}
