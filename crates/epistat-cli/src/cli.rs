//! CLI argument definitions for epistat.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `normalize` | Rebuild the normalized tables from the raw feeds |
//! | `report` | Read one named reporting view |
//! | `views` | List the named reporting views |
//! | `sql` | Query the local DuckDB warehouse |
//! | `schema` | Show the normalized table columns |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, ndjson, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--db` | `$EPISTAT_HOME/warehouse.duckdb` | Warehouse database file |
//!
//! # Examples
//!
//! ```bash
//! # Load raw feeds, then rebuild the normalized tables
//! epistat sql --write "CREATE TABLE raw_covid_deaths AS FROM read_csv_auto('deaths.csv')"
//! epistat sql --write "CREATE TABLE raw_covid_vaccinations AS FROM read_csv_auto('vax.csv')"
//! epistat normalize
//!
//! # Read a view
//! epistat report CountryFinalCasesDeathsMortality --format table
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use epistat_core::ReportView;

/// epistat - COVID-19 case, death, and vaccination statistics
///
/// Normalizes raw OWID-style feeds into keyed tables in a local DuckDB
/// warehouse and serves rate and aggregate reports over them.
#[derive(Debug, Parser)]
#[command(
    name = "epistat",
    author,
    version,
    about = "COVID-19 statistics warehouse and reports"
)]
pub struct Cli {
    /// Output format for results.
    ///
    /// - json: Single JSON object (default)
    /// - ndjson: One JSON object per line
    /// - table: Aligned text table
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Path to the warehouse database file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table for terminal display.
    Table,
    /// Single JSON object output.
    Json,
    /// Newline-delimited JSON (one object per line).
    Ndjson,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rebuild the normalized tables from the raw feeds.
    ///
    /// Each table is dropped and recreated in its own transaction. A raw
    /// feed with a repeated (location, date) fails its table (exit code 3).
    ///
    /// # Examples
    ///
    ///   epistat normalize
    ///   epistat normalize --deaths-table owid_deaths --vaccinations-table owid_vax
    Normalize(NormalizeArgs),

    /// Read one named reporting view.
    ///
    /// # Examples
    ///
    ///   epistat report MaxMortalityRate
    ///   epistat report vw_daily_percentage_vaccinated --max-rows 50
    ///   epistat report GlobalFinalCasesDeathsMortality --engine memory
    Report(ReportArgs),

    /// List the named reporting views.
    Views,

    /// Run SQL queries against the DuckDB warehouse.
    ///
    /// Default mode is read-only; use --write for data modifications such
    /// as loading raw feeds.
    ///
    /// # Examples
    ///
    ///   epistat sql "SELECT * FROM vw_max_mortality_rate LIMIT 10"
    ///   epistat sql --write "DROP TABLE raw_covid_vaccinations"
    Sql(SqlArgs),

    /// Show the columns of the normalized tables.
    Schema,
}

/// Arguments for the `normalize` command.
#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Raw table holding the case and population columns. Defaults to the
    /// deaths table, which carries both in the combined feed.
    #[arg(long)]
    pub facts_table: Option<String>,

    /// Raw table holding the death columns.
    #[arg(long, default_value = "raw_covid_deaths")]
    pub deaths_table: String,

    /// Raw table holding the vaccination columns.
    #[arg(long, default_value = "raw_covid_vaccinations")]
    pub vaccinations_table: String,
}

/// Where report rows are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportEngine {
    /// Read the SQL view.
    Warehouse,
    /// Load the normalized tables and compute the view in process.
    Memory,
}

/// Arguments for the `report` command.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// View name, either `MaxMortalityRate` style or the SQL view name.
    #[arg(value_parser = parse_view)]
    pub view: ReportView,

    /// Maximum number of rows to return.
    #[arg(long, default_value_t = 10_000)]
    pub max_rows: usize,

    /// Query timeout in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    pub query_timeout_ms: u64,

    #[arg(long, value_enum, default_value_t = ReportEngine::Warehouse)]
    pub engine: ReportEngine,
}

/// Arguments for the `sql` command.
#[derive(Debug, Args)]
pub struct SqlArgs {
    /// SQL query to execute.
    pub query: String,

    /// Allow write operations (INSERT, UPDATE, DELETE, CREATE, etc.).
    ///
    /// Without this flag, only SELECT and CTE queries are allowed.
    #[arg(long, default_value_t = false)]
    pub write: bool,

    /// Maximum number of rows to return.
    #[arg(long, default_value_t = 10_000)]
    pub max_rows: usize,

    /// Query timeout in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    pub query_timeout_ms: u64,
}

fn parse_view(value: &str) -> Result<ReportView, String> {
    value.parse().map_err(|error: epistat_core::ValidationError| error.to_string())
}
