//! Shared raw-feed fixture for the warehouse tests.
//!
//! The same rows are written to DuckDB raw tables and converted to the
//! in-memory feed types, so both pipelines see identical input.

#![allow(dead_code)]

use epistat_core::{RawCovidRow, RawVaccinationRow, ReportDate};
use epistat_warehouse::{QueryGuardrails, Warehouse, WarehouseConfig};
use tempfile::TempDir;

#[derive(Debug, Clone, Copy)]
pub struct FeedRow {
    pub location: &'static str,
    pub date: &'static str,
    pub continent: Option<&'static str>,
    pub population: Option<i64>,
    pub new_cases: Option<i64>,
    pub total_cases: Option<i64>,
    pub new_deaths: Option<i64>,
    pub total_deaths: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct VaxRow {
    pub location: &'static str,
    pub date: &'static str,
    pub new_vaccinations: Option<i64>,
}

#[allow(clippy::too_many_arguments)]
pub const fn feed(
    location: &'static str,
    date: &'static str,
    continent: Option<&'static str>,
    population: Option<i64>,
    new_cases: Option<i64>,
    total_cases: Option<i64>,
    new_deaths: Option<i64>,
    total_deaths: Option<i64>,
) -> FeedRow {
    FeedRow {
        location,
        date,
        continent,
        population,
        new_cases,
        total_cases,
        new_deaths,
        total_deaths,
    }
}

pub const fn vax(location: &'static str, date: &'static str, new: Option<i64>) -> VaxRow {
    VaxRow {
        location,
        date,
        new_vaccinations: new,
    }
}

const D1: &str = "2021-01-01";
const D2: &str = "2021-01-02";
const D3: &str = "2021-01-03";
const SA: Option<&str> = Some("South America");

/// Four countries and two world regions.
pub fn covid_feed() -> Vec<FeedRow> {
    vec![
        feed("Chile", D1, SA, Some(19_000_000), Some(100), Some(100), Some(3), Some(3)),
        feed("Chile", D2, SA, Some(19_000_000), Some(100), Some(200), Some(7), Some(10)),
        feed("Chile", D3, SA, Some(19_000_000), Some(0), Some(200), Some(2), Some(12)),
        feed("Peru", D1, SA, Some(33_000_000), Some(50), Some(50), Some(1), Some(1)),
        feed("Peru", D2, SA, Some(33_000_000), Some(0), Some(50), None, Some(1)),
        feed("Peru", D3, SA, Some(33_000_000), Some(40), Some(80), Some(3), Some(4)),
        feed("Kenya", D1, Some("Africa"), Some(54_000_000), None, None, None, None),
        feed("Kenya", D2, Some("Africa"), Some(54_000_000), Some(0), Some(0), Some(0), Some(0)),
        feed("Kenya", D3, Some("Africa"), Some(54_000_000), Some(20), Some(20), Some(1), Some(1)),
        feed("Norway", D1, Some("Europe"), Some(5_400_000), Some(10), Some(10), Some(0), Some(0)),
        feed("Norway", D2, Some("Europe"), Some(5_400_000), Some(0), Some(10), Some(0), Some(0)),
        feed("World", D1, None, Some(7_800_000_000), Some(10_000), Some(10_000), Some(500), Some(500)),
        feed("World", D2, None, Some(7_800_000_000), Some(10_000), Some(20_000), Some(400), Some(900)),
        feed("World", D3, None, Some(7_800_000_000), Some(10_000), Some(30_000), Some(300), Some(1_200)),
        feed("European Union", D1, None, Some(447_000_000), Some(1_000), Some(1_000), Some(10), Some(10)),
        feed("European Union", D2, None, Some(447_000_000), Some(500), Some(1_500), Some(10), Some(20)),
        feed("European Union", D3, None, Some(447_000_000), Some(300), Some(1_800), Some(10), Some(30)),
    ]
}

/// Includes a null gap, a region, and a location with no facts at all.
pub fn vaccination_feed() -> Vec<VaxRow> {
    vec![
        vax("Chile", D1, Some(100)),
        vax("Chile", D2, None),
        vax("Chile", D3, Some(50)),
        vax("Peru", D1, None),
        vax("Peru", D2, Some(2_000)),
        vax("Peru", D3, Some(3_000)),
        vax("Norway", D1, Some(5_400_000)),
        vax("Norway", D2, Some(1_000_000)),
        vax("World", D1, Some(1_000)),
        vax("World", D2, Some(1_000)),
        vax("World", D3, Some(1_000)),
        vax("Atlantis", D1, Some(10)),
    ]
}

pub fn open_warehouse(temp: &TempDir) -> Warehouse {
    Warehouse::open(WarehouseConfig {
        max_pool_size: 2,
        ..WarehouseConfig::in_home(temp.path().join("epistat-home"))
    })
    .expect("warehouse open")
}

/// Replace the default raw tables with `covid` and `vaccinations`.
pub fn load_raw(warehouse: &Warehouse, covid: &[FeedRow], vaccinations: &[VaxRow]) {
    load_raw_into(
        warehouse,
        "raw_covid_deaths",
        covid,
        "raw_covid_vaccinations",
        vaccinations,
    );
}

pub fn load_raw_into(
    warehouse: &Warehouse,
    covid_table: &str,
    covid: &[FeedRow],
    vaccinations_table: &str,
    vaccinations: &[VaxRow],
) {
    let mut sql = format!(
        "CREATE OR REPLACE TABLE {covid_table} (
            location TEXT, date DATE, iso_code TEXT, continent TEXT, population BIGINT,
            new_cases BIGINT, total_cases BIGINT, new_deaths BIGINT, total_deaths BIGINT);
         CREATE OR REPLACE TABLE {vaccinations_table} (
            location TEXT, date DATE, new_vaccinations BIGINT, total_vaccinations BIGINT);"
    );

    if !covid.is_empty() {
        let values: Vec<_> = covid
            .iter()
            .map(|row| {
                format!(
                    "('{}', DATE '{}', NULL, {}, {}, {}, {}, {}, {})",
                    row.location,
                    row.date,
                    text(row.continent),
                    int(row.population),
                    int(row.new_cases),
                    int(row.total_cases),
                    int(row.new_deaths),
                    int(row.total_deaths),
                )
            })
            .collect();
        sql.push_str(&format!(
            "INSERT INTO {covid_table} VALUES {};",
            values.join(", ")
        ));
    }

    if !vaccinations.is_empty() {
        let values: Vec<_> = vaccinations
            .iter()
            .map(|row| {
                format!(
                    "('{}', DATE '{}', {}, NULL)",
                    row.location,
                    row.date,
                    int(row.new_vaccinations)
                )
            })
            .collect();
        sql.push_str(&format!(
            "INSERT INTO {vaccinations_table} VALUES {};",
            values.join(", ")
        ));
    }

    warehouse
        .execute_query(&sql, QueryGuardrails::default(), true)
        .expect("load raw tables");
}

pub fn raw_covid_rows(rows: &[FeedRow]) -> Vec<RawCovidRow> {
    rows.iter()
        .map(|row| RawCovidRow {
            location: row.location.to_string(),
            date: ReportDate::parse(row.date).expect("valid date"),
            iso_code: None,
            continent: row.continent.map(str::to_string),
            population: row.population,
            new_cases: row.new_cases,
            total_cases: row.total_cases,
            new_deaths: row.new_deaths,
            total_deaths: row.total_deaths,
        })
        .collect()
}

pub fn raw_vaccination_rows(rows: &[VaxRow]) -> Vec<RawVaccinationRow> {
    rows.iter()
        .map(|row| RawVaccinationRow {
            location: row.location.to_string(),
            date: ReportDate::parse(row.date).expect("valid date"),
            new_vaccinations: row.new_vaccinations,
            total_vaccinations: None,
        })
        .collect()
}

pub fn count(warehouse: &Warehouse, sql: &str) -> i64 {
    let result = warehouse
        .execute_query(sql, QueryGuardrails::default(), false)
        .expect("count query");
    result.rows[0][0].as_i64().expect("integer count")
}

pub fn day(value: &str) -> ReportDate {
    ReportDate::parse(value).expect("valid date")
}

fn int(value: Option<i64>) -> String {
    value.map_or_else(|| String::from("NULL"), |value| value.to_string())
}

fn text(value: Option<&str>) -> String {
    value.map_or_else(|| String::from("NULL"), |value| format!("'{value}'"))
}
