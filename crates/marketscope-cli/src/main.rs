//! Marketscope CLI - admin and history browsing for the persistent store.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use marketscope_cli::logging::{self, LogConfig, LogFormat};
use marketscope_cli::{commands, config::Config};
use marketscope_core::MarketStore;
use marketscope_types::DeleteScope;
use std::path::PathBuf;

/// Admin CLI for the Marketscope persistent store.
#[derive(Parser, Debug)]
#[command(name = "marketscope")]
#[command(about = "Admin and history browsing for the Marketscope store")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override store path from config
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Enable verbose logging (INFO level)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging
    #[arg(long)]
    trace: bool,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "cache=debug").
    /// Can be specified multiple times. Targets are prefixed with "marketscope::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Row counts and file size
    Stats,
    /// Most queried subjects in the analysis cache
    Popular {
        #[arg(long, default_value_t = 30)]
        days: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Browse stored history
    History {
        #[command(subcommand)]
        view: HistoryView,
    },
    /// Restore bundle for one document: chunk ranges plus Q&A replay
    Show { document_id: i64 },
    /// Delete expired cache entries
    Sweep,
    /// Age-based cleanup of append-only logs
    Purge {
        #[command(subcommand)]
        target: PurgeTarget,
    },
    /// Bulk delete with two-step confirmation
    Wipe {
        scope: WipeScope,
        /// Skip the interactive prompt
        #[arg(long)]
        yes: bool,
    },
    /// Reclaim file space after large deletions
    Compact,
    /// Write a compacted snapshot of the store
    Backup { dest: PathBuf },
    /// Telemetry usage summary
    Usage {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryView {
    /// Distinct cached analyses, newest first
    Analyses {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Processed documents with their Q&A counts
    Documents {
        #[arg(long, default_value_t = 15)]
        limit: u32,
    },
    /// Recent M&A searches
    Searches {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[derive(Subcommand, Debug)]
enum PurgeTarget {
    /// Search history older than the cutoff
    Searches {
        #[arg(long = "older-than-days")]
        days: u32,
    },
    /// Telemetry events older than the cutoff (config default: 90 days)
    Telemetry {
        #[arg(long = "older-than-days")]
        days: Option<u32>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WipeScope {
    Cache,
    Documents,
    Searches,
    Telemetry,
    Everything,
}

impl From<WipeScope> for DeleteScope {
    fn from(scope: WipeScope) -> Self {
        match scope {
            WipeScope::Cache => DeleteScope::AnalysisCache,
            WipeScope::Documents => DeleteScope::Documents,
            WipeScope::Searches => DeleteScope::Searches,
            WipeScope::Telemetry => DeleteScope::Telemetry,
            WipeScope::Everything => DeleteScope::Everything,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let store = MarketStore::open(&config.db_path)?;

    match cli.command {
        Commands::Stats => commands::stats::run(&store),
        Commands::Popular { days, limit } => commands::cache::popular(&store, days, limit),
        Commands::History { view } => match view {
            HistoryView::Analyses { limit } => commands::history::analyses(&store, limit),
            HistoryView::Documents { limit } => commands::history::documents(&store, limit),
            HistoryView::Searches { limit } => commands::history::searches(&store, limit),
        },
        Commands::Show { document_id } => commands::history::show(&store, document_id),
        Commands::Sweep => commands::cache::sweep(&store),
        Commands::Purge { target } => match target {
            PurgeTarget::Searches { days } => commands::maintenance::purge_searches(&store, days),
            PurgeTarget::Telemetry { days } => commands::maintenance::purge_telemetry(
                &store,
                days.unwrap_or(config.telemetry_retention_days),
            ),
        },
        Commands::Wipe { scope, yes } => {
            commands::maintenance::wipe(&store, scope.into(), config.confirm_window_secs, yes)
        }
        Commands::Compact => commands::maintenance::compact(&store),
        Commands::Backup { dest } => commands::maintenance::backup(&store, &dest),
        Commands::Usage { days } => commands::usage::run(&store, days),
    }
}
