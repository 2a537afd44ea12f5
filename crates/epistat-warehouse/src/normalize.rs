//! Rebuild of the normalized tables from the raw source feeds.
//!
//! Each table is replaced wholesale (drop, create, bulk insert) inside its
//! own transaction. There is no transaction spanning all three tables: a
//! failure on a later table leaves the earlier ones rebuilt.

use ::duckdb::{params, Connection, ToSql};
use epistat_core::normalize::{DEATHS_TABLE, FACTS_TABLE, VACCINATIONS_TABLE};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{finalize_transaction, WarehouseError};

/// One of the three keyed tables produced by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NormalizedTable {
    Facts,
    Deaths,
    Vaccinations,
}

impl NormalizedTable {
    pub const ALL: [Self; 3] = [Self::Facts, Self::Deaths, Self::Vaccinations];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Facts => FACTS_TABLE,
            Self::Deaths => DEATHS_TABLE,
            Self::Vaccinations => VACCINATIONS_TABLE,
        }
    }

    const fn columns(self) -> &'static str {
        match self {
            Self::Facts => {
                "country TEXT NOT NULL,
    date DATE NOT NULL,
    code TEXT,
    continent TEXT,
    population BIGINT,
    new_cases BIGINT,
    total_cases BIGINT"
            }
            Self::Deaths => {
                "country TEXT NOT NULL,
    date DATE NOT NULL,
    new_deaths BIGINT,
    total_deaths BIGINT"
            }
            Self::Vaccinations => {
                "country TEXT NOT NULL,
    date DATE NOT NULL,
    new_vaccinations BIGINT,
    total_vaccinations BIGINT"
            }
        }
    }

    /// Select list over the raw feed. Columns are picked and renamed only.
    const fn projection(self) -> &'static str {
        match self {
            Self::Facts => {
                "location, CAST(date AS DATE), iso_code, continent, \
                 population, new_cases, total_cases"
            }
            Self::Deaths => "location, CAST(date AS DATE), new_deaths, total_deaths",
            Self::Vaccinations => {
                "location, CAST(date AS DATE), new_vaccinations, total_vaccinations"
            }
        }
    }

    const fn insert_columns(self) -> &'static str {
        match self {
            Self::Facts => {
                "country, date, code, continent, population, new_cases, total_cases"
            }
            Self::Deaths => "country, date, new_deaths, total_deaths",
            Self::Vaccinations => "country, date, new_vaccinations, total_vaccinations",
        }
    }

    pub(crate) fn create_sql(self, if_not_exists: bool) -> String {
        format!(
            "CREATE TABLE {guard}{name} (\n    {columns},\n    PRIMARY KEY (country, date)\n);",
            guard = if if_not_exists { "IF NOT EXISTS " } else { "" },
            name = self.name(),
            columns = self.columns(),
        )
    }
}

/// Names of the raw tables the normalizer reads.
///
/// The facts and deaths projections usually read the same combined feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawSourceTables {
    pub facts: String,
    pub deaths: String,
    pub vaccinations: String,
}

impl Default for RawSourceTables {
    fn default() -> Self {
        Self::combined("raw_covid_deaths", "raw_covid_vaccinations")
    }
}

impl RawSourceTables {
    /// Facts and deaths both read from `deaths`.
    pub fn combined(deaths: impl Into<String>, vaccinations: impl Into<String>) -> Self {
        let deaths = deaths.into();
        Self {
            facts: deaths.clone(),
            deaths,
            vaccinations: vaccinations.into(),
        }
    }

    pub fn source_for(&self, table: NormalizedTable) -> &str {
        match table {
            NormalizedTable::Facts => &self.facts,
            NormalizedTable::Deaths => &self.deaths,
            NormalizedTable::Vaccinations => &self.vaccinations,
        }
    }

    /// Every name must be a plain identifier, since it is spliced into SQL.
    pub fn validate(&self) -> Result<(), WarehouseError> {
        for table in NormalizedTable::ALL {
            let name = self.source_for(table);
            if !is_plain_identifier(name) {
                return Err(WarehouseError::InvalidIdentifier(name.to_owned()));
            }
        }
        Ok(())
    }
}

/// Outcome of rebuilding one normalized table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRebuild {
    pub table: &'static str,
    pub source_table: String,
    pub row_count: u64,
}

/// Outcome of a full normalizer run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub run_id: String,
    pub tables: Vec<TableRebuild>,
}

pub(crate) fn rebuild_all(
    connection: &Connection,
    sources: &RawSourceTables,
    run_id: &str,
) -> Result<NormalizeReport, WarehouseError> {
    sources.validate()?;

    let mut tables = Vec::with_capacity(NormalizedTable::ALL.len());
    for table in NormalizedTable::ALL {
        let source = sources.source_for(table);
        match rebuild_table(connection, table, source) {
            Ok(row_count) => {
                info!(table = table.name(), source, row_count, "rebuilt normalized table");
                record_run(connection, run_id, table, source, Some(row_count), "ok", None)?;
                tables.push(TableRebuild {
                    table: table.name(),
                    source_table: source.to_owned(),
                    row_count,
                });
            }
            Err(failure) => {
                error!(table = table.name(), source, %failure, "normalized table rebuild failed");
                let message = failure.to_string();
                if let Err(log_error) = record_run(
                    connection,
                    run_id,
                    table,
                    source,
                    None,
                    "failed",
                    Some(message.as_str()),
                ) {
                    warn!(
                        table = table.name(),
                        run_id,
                        %log_error,
                        "could not record failed rebuild in normalize_log"
                    );
                }
                return Err(failure);
            }
        }
    }

    Ok(NormalizeReport {
        run_id: run_id.to_owned(),
        tables,
    })
}

fn rebuild_table(
    connection: &Connection,
    table: NormalizedTable,
    source: &str,
) -> Result<u64, WarehouseError> {
    ensure_source_exists(connection, source)?;
    ensure_unique_keys(connection, table, source)?;

    connection.execute_batch("BEGIN TRANSACTION")?;
    let result = (|| -> Result<u64, WarehouseError> {
        connection.execute_batch(&format!("DROP TABLE IF EXISTS {};", table.name()))?;
        connection.execute_batch(&table.create_sql(false))?;
        let inserted = connection.execute(
            &format!(
                "INSERT INTO {table} ({columns}) SELECT {projection} FROM \"{source}\"",
                table = table.name(),
                columns = table.insert_columns(),
                projection = table.projection(),
            ),
            [],
        )?;
        Ok(inserted as u64)
    })();

    finalize_transaction(connection, result)
}

fn ensure_source_exists(connection: &Connection, source: &str) -> Result<(), WarehouseError> {
    let found: i64 = connection.query_row(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
        params![source],
        |row| row.get(0),
    )?;
    if found == 0 {
        return Err(WarehouseError::MissingSource(source.to_owned()));
    }
    Ok(())
}

/// Fail on the first `(location, date)` that occurs more than once.
fn ensure_unique_keys(
    connection: &Connection,
    table: NormalizedTable,
    source: &str,
) -> Result<(), WarehouseError> {
    let sql = format!(
        "SELECT location, CAST(day AS VARCHAR) \
         FROM (SELECT location, CAST(date AS DATE) AS day FROM \"{source}\") \
         GROUP BY location, day \
         HAVING COUNT(*) > 1 \
         ORDER BY location, day \
         LIMIT 1"
    );
    let mut statement = connection.prepare(&sql)?;
    let mut rows = statement.query([] as [&dyn ToSql; 0])?;
    if let Some(row) = rows.next()? {
        let country: Option<String> = row.get(0)?;
        let date: Option<String> = row.get(1)?;
        return Err(WarehouseError::DuplicateKey {
            table: table.name(),
            country: country.unwrap_or_else(|| String::from("<null>")),
            date: date.unwrap_or_else(|| String::from("<null>")),
        });
    }
    Ok(())
}

fn record_run(
    connection: &Connection,
    run_id: &str,
    table: NormalizedTable,
    source: &str,
    row_count: Option<u64>,
    status: &str,
    message: Option<&str>,
) -> Result<(), WarehouseError> {
    connection.execute(
        "INSERT INTO normalize_log \
         (run_id, table_name, source_table, row_count, status, message, timestamp) \
         VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
        params![run_id, table.name(), source, row_count, status, message],
    )?;
    Ok(())
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}
