use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::Result;
use crate::stopwords::StopwordSet;

/// Data directory used when `--data-dir` is not given.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Number of ranked words kept for the word treemap.
pub const DEFAULT_TOP_N: u32 = 50;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Case-management dashboard and client journey data pipeline
#[derive(Parser, Debug, Clone)]
#[command(
    name = "client-journey",
    about = "Case-management dashboard and client journey data pipeline",
    version
)]
pub struct Settings {
    /// Report to build
    #[arg(long, default_value = "dashboard", value_parser = ["dashboard", "journey"])]
    pub view: String,

    /// Client display name (journey view)
    #[arg(long)]
    pub client: Option<String>,

    /// Directory holding the exported CSV / JSON files
    #[arg(long, env = "CLIENT_JOURNEY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Stopword mapping file (JSON object of token -> excluded)
    #[arg(long)]
    pub stopwords: Option<PathBuf>,

    /// Number of ranked words to keep (1-500)
    #[arg(long, default_value_t = DEFAULT_TOP_N, value_parser = clap::value_parser!(u32).range(1..=500))]
    pub top_n: u32,

    /// Write the report here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Parse an explicit argument list. Every run starts from the CLI alone;
    /// nothing carries over between runs.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::apply_debug(Settings::parse_from(args))
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// The configured data directory, or [`DEFAULT_DATA_DIR`].
    pub fn data_dir_or_default(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Load the configured stopword file, or the built-in list.
    pub fn stopword_set(&self) -> Result<StopwordSet> {
        match &self.stopwords {
            Some(path) => StopwordSet::load_from(path),
            None => StopwordSet::builtin(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
