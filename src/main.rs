//! scimagojr - SCImago journal rankings in a local database
//!
//! Imports the published journal-rank feed and lets you list, search,
//! inspect and export journals from the command line or a TUI.

use anyhow::Result;
use clap::Parser;
use scimagojr::cli::{
    config, export, facets, impact, import, init, list, search, show, status, Cli, Commands,
};
use scimagojr::query::SearchFilter;
use scimagojr::workspace::Workspace;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Setup logging; the TUI owns the terminal so it gets none
    if !matches!(cli.command, Commands::Tui) {
        let default_level = if cli.verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    let data_dir = cli.data_dir.as_deref();

    // Execute command
    match cli.command {
        Commands::Init(args) => {
            init(data_dir, args.force)?;
        }

        Commands::Import(args) => {
            let workspace = Workspace::open(data_dir)?;
            import(&workspace, &args, cli.format)?;
        }

        Commands::List => {
            let workspace = Workspace::open(data_dir)?;
            list(&workspace, cli.format)?;
        }

        Commands::Search(args) => {
            let workspace = Workspace::open(data_dir)?;
            search(&workspace, &SearchFilter::from(args.filter), cli.format)?;
        }

        Commands::Show(args) => {
            let workspace = Workspace::open(data_dir)?;
            show(&workspace, args.id, cli.format)?;
        }

        Commands::Export(args) => {
            let workspace = Workspace::open(data_dir)?;
            export(&workspace, args)?;
        }

        Commands::Impact(args) => {
            let workspace = Workspace::open(data_dir)?;
            impact(&workspace, &args, cli.format)?;
        }

        Commands::Facets => {
            let workspace = Workspace::open(data_dir)?;
            facets(&workspace, cli.format)?;
        }

        Commands::Status => {
            let workspace = Workspace::open(data_dir)?;
            status(&workspace, cli.format)?;
        }

        Commands::Config(args) => {
            let mut workspace = Workspace::open(data_dir)?;
            config(&mut workspace, &args)?;
        }

        Commands::Tui => {
            let workspace = Workspace::open(data_dir)?;
            scimagojr::tui::run(workspace)?;
        }
    }

    Ok(())
}
