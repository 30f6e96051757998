use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Fill a sheet from the autofill job service and export the result.
#[derive(Parser, Debug)]
#[command(name = "smartsheet", version, about, long_about = None)]
pub struct Cli {
    /// CSV file holding the sheet: header row of attributes, label column
    /// of items.
    pub input: PathBuf,

    /// How the sheet is submitted
    #[arg(short, long, value_enum, default_value_t = Mode::Labels)]
    pub mode: Mode,

    /// Job service base URL (overrides JOB_SERVICE_URL)
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,

    /// Poll interval in milliseconds (overrides POLL_INTERVAL_MS)
    #[arg(long = "poll-interval-ms")]
    pub poll_interval_ms: Option<u64>,

    /// Give up waiting for the batch after this many seconds
    #[arg(long = "wait-secs", default_value_t = 600)]
    pub wait_secs: u64,

    /// Where to write the filled sheet (default: smartspreadsheet_<millis>.csv)
    #[arg(long = "csv-out")]
    pub csv_out: Option<PathBuf>,

    /// Also write the raw batch results as pretty JSON
    #[arg(long = "json-out")]
    pub json_out: Option<PathBuf>,

    /// Submit without probing /health first
    #[arg(long = "skip-health")]
    pub skip_health: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// One job per (row label, column attribute) pair
    Labels,
    /// The whole table under a generated sheet id
    Table,
}
