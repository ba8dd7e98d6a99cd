//! CLI argument definitions using clap.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::models::{BillAnalysisInput, DEFAULT_DURATION_MINUTES, LeakCheckInput};
use crate::error::{FlowError, Result};

/// Default number of rows returned by list commands.
pub const DEFAULT_LIST_LIMIT: u32 = 50;
/// Largest accepted list limit.
pub const MAX_LIST_LIMIT: u32 = 100;

/// FlowSense - household water leak checks and bill analysis.
#[derive(Parser, Debug)]
#[command(name = "flowsense")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Database file (overrides FLOWSENSE_DB and the config file)
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,
}

impl Cli {
    /// Output format from flags alone, used before configuration is resolved.
    #[must_use]
    pub fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format.unwrap_or_default()
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record and inspect leak checks
    #[command(subcommand)]
    Leak(LeakCommand),

    /// Scan, record, and inspect water bills
    #[command(subcommand)]
    Bill(BillCommand),

    /// Show the household guardian status (default command)
    Status,

    /// Diagnose configuration, storage, and extraction setup
    Doctor,
}

/// Leak check subcommands.
#[derive(Subcommand, Debug)]
pub enum LeakCommand {
    /// Classify two meter readings and store the result
    Check(LeakCheckArgs),
    /// List stored leak checks, newest first
    List(ListArgs),
    /// Show one leak check
    Show {
        /// Leak check id
        id: i64,
    },
}

/// Bill subcommands.
#[derive(Subcommand, Debug)]
pub enum BillCommand {
    /// Extract fields from a bill photo
    Scan(BillScanArgs),
    /// Store a bill entered by hand
    Add(BillAddArgs),
    /// List stored bill analyses, newest first
    List(ListArgs),
    /// Show one bill analysis
    Show {
        /// Bill analysis id
        id: i64,
    },
}

/// Arguments for `leak check`.
#[derive(Args, Debug, Clone)]
pub struct LeakCheckArgs {
    /// First meter reading
    #[arg(long, allow_hyphen_values = true)]
    pub reading_a: f64,

    /// Second meter reading
    #[arg(long, allow_hyphen_values = true)]
    pub reading_b: f64,

    /// No water was used between the two readings
    #[arg(long)]
    pub no_water_used: bool,

    /// Minutes between the two readings
    #[arg(long, default_value_t = DEFAULT_DURATION_MINUTES, allow_hyphen_values = true)]
    pub duration: i64,

    /// Photo of the first reading
    #[arg(long, value_name = "PATH")]
    pub photo_a: Option<String>,

    /// Photo of the second reading
    #[arg(long, value_name = "PATH")]
    pub photo_b: Option<String>,
}

impl LeakCheckArgs {
    /// Reject readings and durations the classifier should never see.
    pub fn validate(&self) -> Result<()> {
        validate_quantity("reading_a", self.reading_a)?;
        validate_quantity("reading_b", self.reading_b)?;
        if self.duration < 1 {
            return Err(FlowError::invalid_input(
                "duration",
                format!("must be at least 1 minute, got {}", self.duration),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_input(&self) -> LeakCheckInput {
        LeakCheckInput {
            photo_path_a: self.photo_a.clone(),
            photo_path_b: self.photo_b.clone(),
            ..LeakCheckInput::new(self.reading_a, self.reading_b, self.no_water_used)
                .with_duration(self.duration)
        }
    }
}

/// Arguments for `bill scan`.
#[derive(Args, Debug, Clone)]
pub struct BillScanArgs {
    /// Bill image file
    pub image: PathBuf,

    /// Print the extraction without storing it
    #[arg(long)]
    pub no_save: bool,

    /// Extraction timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

/// Arguments for `bill add`.
#[derive(Args, Debug, Clone)]
pub struct BillAddArgs {
    /// First day of the billing period (YYYY-MM-DD)
    #[arg(long)]
    pub period_start: NaiveDate,

    /// Last day of the billing period (YYYY-MM-DD)
    #[arg(long)]
    pub period_end: NaiveDate,

    /// Water used in the period
    #[arg(long, allow_hyphen_values = true)]
    pub usage: f64,

    /// Amount billed
    #[arg(long, allow_hyphen_values = true)]
    pub amount: f64,

    /// Photo of the bill
    #[arg(long, value_name = "PATH")]
    pub photo: Option<String>,
}

impl BillAddArgs {
    pub fn validate(&self) -> Result<()> {
        if self.period_start >= self.period_end {
            return Err(FlowError::invalid_input(
                "period",
                format!(
                    "start {} must be before end {}",
                    self.period_start, self.period_end
                ),
            ));
        }
        validate_quantity("usage", self.usage)?;
        validate_quantity("amount", self.amount)
    }

    #[must_use]
    pub fn to_input(&self) -> BillAnalysisInput {
        BillAnalysisInput {
            period_start: self.period_start,
            period_end: self.period_end,
            usage: self.usage,
            amount: self.amount,
            photo_path: self.photo.clone(),
        }
    }
}

/// Arguments shared by the list commands.
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Maximum rows to return (1-100)
    #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
    pub limit: u32,
}

impl ListArgs {
    pub fn validate(&self) -> Result<()> {
        if (1..=MAX_LIST_LIMIT).contains(&self.limit) {
            Ok(())
        } else {
            Err(FlowError::invalid_input(
                "limit",
                format!("must be between 1 and {MAX_LIST_LIMIT}, got {}", self.limit),
            ))
        }
    }
}

fn validate_quantity(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(FlowError::invalid_input(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(FlowError::invalid_input(
            field,
            format!("must not be negative, got {value}"),
        ));
    }
    Ok(())
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    #[default]
    Human,
    /// JSON output
    Json,
    /// Markdown output
    Md,
}
