/// CLI argument definitions via clap derive.
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};

use crate::mastr::{DEFAULT_WSDL_URL, Role};

/// Largest page size the registry accepts.
pub const MAX_PAGE_SIZE: u32 = 2000;

/// mastr-fetch: export MaStR registry records as JSON lines.
#[derive(Debug, Parser)]
#[command(
    name = "mastr-fetch",
    about = "Fetch market participants and storage units from the MaStR SOAP API as JSON lines",
    long_about = "Fetch market participants and storage units from the MaStR SOAP API as JSON lines.\n\n\
                  Requires MASTR_API_KEY and MASTR_MARKTAKTEUR in the environment.",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// WSDL of the registry web service.
    #[arg(long, global = true, value_name = "URL", default_value = DEFAULT_WSDL_URL)]
    pub wsdl: String,

    /// HTTP timeout per request, in seconds.
    #[arg(
        long,
        global = true,
        value_name = "SECS",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Delta query: only records changed since this ISO-8601 date or datetime,
    /// e.g. "2025-01-01T00:00:00". Sent to the registry verbatim.
    #[arg(long, global = true, value_name = "ISO_DATETIME", value_parser = parse_datum_ab)]
    pub datum_ab: Option<String>,

    /// Pause between page requests, in seconds.
    #[arg(long, global = true, value_name = "SECS", default_value_t = 0.0, value_parser = parse_seconds)]
    pub sleep: f64,

    /// Format for the role listing and errors. Record streams are always JSON lines.
    #[arg(long, global = true, value_name = "FORMAT", default_value = "auto")]
    pub output: OutputFormat,

    /// Shorthand for --output json.
    #[arg(long, global = true, conflicts_with = "output")]
    pub json: bool,

    /// Omit table headers.
    #[arg(long, global = true)]
    pub no_header: bool,

    /// Log progress details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log request tracing and step timings to stderr.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format variants for non-streaming output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Auto-detect: table when stdout is a TTY, json when piped.
    #[default]
    Auto,
    /// Pretty-printed JSON.
    Json,
    /// Compact single-line JSON.
    Compact,
    /// Aligned table with headers (human-readable).
    Table,
}

/// All subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Market participants in the electricity market, filtered by role.
    Actors(ActorsArgs),
    /// Electricity storage units (unit list -> storage filter -> details).
    StorageUnits(StorageUnitsArgs),
    /// Look up market participants by MaStR number, one JSON line each.
    Actor(ActorArgs),
    /// List the accepted --role values and their registry codes.
    Roles,
}

/// Arguments for `mastr-fetch actors`.
#[derive(Debug, Parser)]
pub struct ActorsArgs {
    /// Market role: BV (balance responsible), LT (supplier), MB (metering operator).
    #[arg(long, value_enum, ignore_case = true)]
    pub role: Role,

    #[command(flatten)]
    pub paging: PagingArgs,
}

/// Arguments for `mastr-fetch storage-units`.
#[derive(Debug, Parser)]
pub struct StorageUnitsArgs {
    #[command(flatten)]
    pub paging: PagingArgs,

    /// Emit the unit list entries only, without fetching details.
    #[arg(long, conflicts_with_all = ["battery", "lithium", "min_power_kw", "exclude_natural_persons"])]
    pub no_details: bool,

    /// Only battery storage.
    #[arg(long)]
    pub battery: bool,

    /// Only lithium-ion batteries.
    #[arg(long)]
    pub lithium: bool,

    /// Only units with gross power strictly above this many kW.
    #[arg(long, value_name = "KW", value_parser = parse_kilowatts)]
    pub min_power_kw: Option<f64>,

    /// Skip units whose operator is a natural person (may look up the operator).
    #[arg(long)]
    pub exclude_natural_persons: bool,
}

/// Paging and sink flags shared by the streaming commands.
#[derive(Debug, Clone, clap::Args)]
pub struct PagingArgs {
    /// Records per page request.
    #[arg(
        long,
        value_name = "N",
        default_value_t = MAX_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PAGE_SIZE))
    )]
    pub limit: u32,

    /// Stop after emitting this many records.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_records: Option<u64>,

    /// Output JSONL file (default: stdout). Written atomically.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Arguments for `mastr-fetch actor`.
#[derive(Debug, Parser)]
pub struct ActorArgs {
    /// MaStR numbers of market participants (e.g. ABR900000000001).
    #[arg(value_name = "MASTR_NUMMER", required_unless_present = "from")]
    pub mastr_nummern: Vec<String>,

    /// Also read numbers from this file, one per line; `#` starts a comment.
    #[arg(long, value_name = "PATH")]
    pub from: Option<PathBuf>,

    /// Output JSONL file (default: stdout). Written atomically.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Accept an ISO-8601 date, naive datetime, or RFC 3339 timestamp and keep it unchanged.
fn parse_datum_ab(raw: &str) -> Result<String, String> {
    let value = raw.trim();
    let valid = DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();
    if valid {
        Ok(raw.to_owned())
    } else {
        Err(format!(
            "'{raw}' is not an ISO-8601 date or datetime (e.g. 2025-01-01T00:00:00)"
        ))
    }
}

fn parse_seconds(raw: &str) -> Result<f64, String> {
    parse_non_negative(raw, "seconds")
}

fn parse_kilowatts(raw: &str) -> Result<f64, String> {
    parse_non_negative(raw, "kW")
}

fn parse_non_negative(raw: &str, unit: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number of {unit}"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("{unit} must be a non-negative number, got '{raw}'"))
    }
}
