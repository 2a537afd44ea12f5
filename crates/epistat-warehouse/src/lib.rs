//! # Epistat Warehouse
//!
//! DuckDB storage for COVID-19 statistics: the normalized tables, the
//! normalizer that rebuilds them from raw feeds, and the named reporting
//! views.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use epistat_warehouse::{QueryGuardrails, RawSourceTables, Warehouse};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open_default()?;
//!
//!     // Raw feeds are loaded beforehand, e.g. with `read_csv_auto`.
//!     let report = warehouse.normalize(&RawSourceTables::default(), "run-001")?;
//!     for table in &report.tables {
//!         println!("{}: {} rows", table.table, table.row_count);
//!     }
//!
//!     let result = warehouse.execute_query(
//!         "SELECT * FROM vw_country_final_cases_deaths_mortality LIMIT 10",
//!         QueryGuardrails::default(),
//!         false,
//!     )?;
//!     println!("Found {} rows", result.row_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `covid_facts` | Cases, population, and continent per `(country, date)` |
//! | `covid_deaths` | Deaths per `(country, date)` |
//! | `covid_vaccinations` | Vaccinations per `(country, date)` |
//! | `normalize_log` | One entry per table per normalizer run |
//!
//! Every reporting view is named by [`ReportView::sql_view`].

pub mod duckdb;
pub mod error;
pub mod migrations;
pub mod normalize;
pub mod query;
mod readers;
pub mod views;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ::duckdb::Connection;
use epistat_core::ReportView;
use serde::Serialize;
use tracing::info;

pub use crate::duckdb::{AccessMode, ConnectionPool, PooledConnection};
pub use error::WarehouseError;
pub use normalize::{NormalizeReport, NormalizedTable, RawSourceTables, TableRebuild};
pub use query::{QueryGuardrails, QueryResult, SqlColumn};

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for epistat data.
    pub home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept per access mode.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::in_home(resolve_epistat_home())
    }
}

impl WarehouseConfig {
    /// Default layout under `home`.
    pub fn in_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let db_path = home.join("warehouse.duckdb");
        Self {
            home,
            db_path,
            max_pool_size: 4,
        }
    }
}

/// Columns of one normalized table.
#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<SqlColumn>,
}

/// The COVID-19 statistics warehouse.
#[derive(Clone)]
pub struct Warehouse {
    config: WarehouseConfig,
    pool: ConnectionPool,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse, creating the database file and schema as needed.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let pool = ConnectionPool::open(config.db_path.clone(), config.max_pool_size)?;
        let warehouse = Self { config, pool };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Apply migrations and (re)create the rate macros and views.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        migrations::apply_migrations(&connection)?;
        views::create_views(&connection)?;
        Ok(())
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    pub fn db_path(&self) -> &Path {
        self.pool.db_path()
    }

    pub(crate) fn acquire(&self, mode: AccessMode) -> Result<PooledConnection, WarehouseError> {
        Ok(self.pool.acquire(mode)?)
    }

    /// Rebuild the three normalized tables from the raw feeds, then refresh
    /// the views.
    ///
    /// Each table is checked for duplicate `(location, date)` keys before it
    /// is replaced. A failure stops the run; tables rebuilt earlier in the
    /// same run keep their new contents.
    pub fn normalize(
        &self,
        sources: &RawSourceTables,
        run_id: &str,
    ) -> Result<NormalizeReport, WarehouseError> {
        let started = Instant::now();
        let connection = self.acquire(AccessMode::ReadWrite)?;
        let report = normalize::rebuild_all(&connection, sources, run_id)?;
        views::create_views(&connection)?;
        info!(
            run_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "normalizer run complete"
        );
        Ok(report)
    }

    /// Execute a SQL query with guardrails.
    ///
    /// Read-only unless `allow_write` is set; in read-only mode only a single
    /// `SELECT`-like statement is accepted.
    pub fn execute_query(
        &self,
        sql: &str,
        guardrails: QueryGuardrails,
        allow_write: bool,
    ) -> Result<QueryResult, WarehouseError> {
        guardrails.validate()?;
        let sql = query::normalize_sql(sql)?;

        if !allow_write {
            query::enforce_read_only_query(sql)?;
        }

        let mode = if allow_write {
            AccessMode::ReadWrite
        } else {
            AccessMode::ReadOnly
        };
        let connection = self.acquire(mode)?;
        query::execute_with_guardrails(&connection, sql, guardrails, allow_write)
    }

    /// Rows of one reporting view as untyped JSON, in the view's order.
    pub fn report_view(
        &self,
        view: ReportView,
        guardrails: QueryGuardrails,
    ) -> Result<QueryResult, WarehouseError> {
        guardrails.validate()?;
        let sql = format!(
            "SELECT * FROM {} ORDER BY {}",
            view.sql_view(),
            view.order_by()
        );
        let connection = self.acquire(AccessMode::ReadOnly)?;
        query::execute_select_query(&connection, &sql, guardrails, Instant::now())
    }

    /// Column layout of the normalized tables.
    pub fn schema(&self) -> Result<Vec<TableSchema>, WarehouseError> {
        let connection = self.acquire(AccessMode::ReadOnly)?;
        NormalizedTable::ALL
            .into_iter()
            .map(|table| {
                Ok(TableSchema {
                    table: table.name().to_owned(),
                    columns: table_columns(&connection, table.name())?,
                })
            })
            .collect()
    }
}

fn table_columns(connection: &Connection, table: &str) -> Result<Vec<SqlColumn>, WarehouseError> {
    let mut statement = connection.prepare(
        "SELECT column_name, data_type FROM information_schema.columns \
         WHERE table_name = ? ORDER BY ordinal_position",
    )?;
    let columns = statement
        .query_map([table], |row| {
            Ok(SqlColumn {
                name: row.get(0)?,
                r#type: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Commit on success, roll back on failure.
pub(crate) fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// `EPISTAT_HOME`, else `$HOME/.epistat`, else `.epistat`.
fn resolve_epistat_home() -> PathBuf {
    if let Some(path) = env::var_os("EPISTAT_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".epistat");
    }

    PathBuf::from(".epistat")
}
