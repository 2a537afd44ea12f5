//! Typed reads of the reporting views and the normalized tables.

use ::duckdb::types::Type;
use ::duckdb::{Connection, Row, ToSql};
use epistat_core::{
    ContinentDeathsRow, CountryDeathsRow, CountryFinalRow, DeathRecord, Fact, GlobalDailyRow,
    GlobalFinalRow, InfectionRateRow, MortalityRateRow, NormalizedTables, PeakInfectionRow,
    RegionDeathsRow, ReportDate, ReportSet, ReportView, RollingVaccinationRow,
    VaccinatedPercentageRow, VaccinationRecord,
};

use crate::{AccessMode, Warehouse, WarehouseError};

impl Warehouse {
    pub fn max_mortality_rates(&self) -> Result<Vec<MortalityRateRow>, WarehouseError> {
        self.read_view(ReportView::MaxMortalityRate, "country, max_mortality_rate", |row| {
            Ok(MortalityRateRow {
                country: row.get(0)?,
                max_mortality_rate: row.get(1)?,
            })
        })
    }

    pub fn infection_rates(&self) -> Result<Vec<InfectionRateRow>, WarehouseError> {
        self.read_view(
            ReportView::InfectedRate,
            "country, CAST(date AS VARCHAR), population, total_cases, infection_rate",
            |row| {
                Ok(InfectionRateRow {
                    country: row.get(0)?,
                    date: date_at(row, 1)?,
                    population: row.get(2)?,
                    total_cases: row.get(3)?,
                    infection_rate: row.get(4)?,
                })
            },
        )
    }

    pub fn peak_infection_rates(&self) -> Result<Vec<PeakInfectionRow>, WarehouseError> {
        self.read_view(
            ReportView::PeakInfectedRate,
            "country, population, CAST(date AS VARCHAR), peak_total_cases, peak_infection_rate",
            |row| {
                Ok(PeakInfectionRow {
                    country: row.get(0)?,
                    population: row.get(1)?,
                    date: date_at(row, 2)?,
                    peak_total_cases: row.get(3)?,
                    peak_infection_rate: row.get(4)?,
                })
            },
        )
    }

    pub fn country_total_deaths(&self) -> Result<Vec<CountryDeathsRow>, WarehouseError> {
        self.read_view(ReportView::TotalDeathsOverTime, "country, total_deaths", |row| {
            Ok(CountryDeathsRow {
                country: row.get(0)?,
                total_deaths: row.get(1)?,
            })
        })
    }

    pub fn region_total_deaths(&self) -> Result<Vec<RegionDeathsRow>, WarehouseError> {
        self.read_view(ReportView::RegionTotalDeathsOverTime, "region, total_deaths", |row| {
            Ok(RegionDeathsRow {
                region: row.get(0)?,
                total_deaths: row.get(1)?,
            })
        })
    }

    pub fn continent_total_deaths(&self) -> Result<Vec<ContinentDeathsRow>, WarehouseError> {
        self.read_view(
            ReportView::ContinentTotalDeathsOverTime,
            "continent, total_deaths",
            |row| {
                Ok(ContinentDeathsRow {
                    continent: row.get(0)?,
                    total_deaths: row.get(1)?,
                })
            },
        )
    }

    pub fn country_finals(&self) -> Result<Vec<CountryFinalRow>, WarehouseError> {
        self.read_view(
            ReportView::CountryFinalCasesDeathsMortality,
            "country, total_cases, total_deaths, mortality_rate",
            |row| {
                Ok(CountryFinalRow {
                    country: row.get(0)?,
                    total_cases: row.get(1)?,
                    total_deaths: row.get(2)?,
                    mortality_rate: row.get(3)?,
                })
            },
        )
    }

    pub fn global_daily(&self) -> Result<Vec<GlobalDailyRow>, WarehouseError> {
        self.read_view(
            ReportView::GlobalCasesDeathsMortality,
            "CAST(date AS VARCHAR), new_cases, new_deaths, mortality_rate",
            |row| {
                Ok(GlobalDailyRow {
                    date: date_at(row, 0)?,
                    new_cases: row.get(1)?,
                    new_deaths: row.get(2)?,
                    mortality_rate: row.get(3)?,
                })
            },
        )
    }

    /// The single grand-total row.
    pub fn global_final(&self) -> Result<GlobalFinalRow, WarehouseError> {
        let view = ReportView::GlobalFinalCasesDeathsMortality;
        let mut rows = self.read_view(view, "total_cases, total_deaths, mortality_rate", |row| {
            Ok(GlobalFinalRow {
                total_cases: row.get(0)?,
                total_deaths: row.get(1)?,
                mortality_rate: row.get(2)?,
            })
        })?;
        if rows.len() != 1 {
            return Err(WarehouseError::InvalidRow {
                view: view.sql_view(),
                message: format!("expected exactly one row, got {}", rows.len()),
            });
        }
        Ok(rows.remove(0))
    }

    pub fn rolling_vaccinations(&self) -> Result<Vec<RollingVaccinationRow>, WarehouseError> {
        self.read_view(
            ReportView::CountryVacsRollingCount,
            "continent, country, CAST(date AS VARCHAR), population, new_vaccinations, \
             rolling_vaccinations",
            |row| {
                Ok(RollingVaccinationRow {
                    continent: row.get(0)?,
                    country: row.get(1)?,
                    date: date_at(row, 2)?,
                    population: row.get(3)?,
                    new_vaccinations: row.get(4)?,
                    rolling_vaccinations: row.get(5)?,
                })
            },
        )
    }

    pub fn vaccinated_percentages(&self) -> Result<Vec<VaccinatedPercentageRow>, WarehouseError> {
        self.read_view(
            ReportView::DailyPercentageVaccinated,
            "country, CAST(date AS VARCHAR), population, rolling_vaccinations, \
             percentage_vaccinated",
            |row| {
                Ok(VaccinatedPercentageRow {
                    country: row.get(0)?,
                    date: date_at(row, 1)?,
                    population: row.get(2)?,
                    rolling_vaccinations: row.get(3)?,
                    percentage_vaccinated: row.get(4)?,
                })
            },
        )
    }

    /// Every view read from the database, in the same shape the in-memory
    /// pipeline produces.
    pub fn report_set(&self) -> Result<ReportSet, WarehouseError> {
        Ok(ReportSet {
            max_mortality_rate: self.max_mortality_rates()?,
            infected_rate: self.infection_rates()?,
            peak_infected_rate: self.peak_infection_rates()?,
            total_deaths_over_time: self.country_total_deaths()?,
            region_total_deaths_over_time: self.region_total_deaths()?,
            continent_total_deaths_over_time: self.continent_total_deaths()?,
            country_final_cases_deaths_mortality: self.country_finals()?,
            global_cases_deaths_mortality: self.global_daily()?,
            global_final_cases_deaths_mortality: self.global_final()?,
            country_vacs_rolling_count: self.rolling_vaccinations()?,
            daily_percentage_vaccinated: self.vaccinated_percentages()?,
        })
    }

    /// Load the normalized tables into memory.
    pub fn load_tables(&self) -> Result<NormalizedTables, WarehouseError> {
        let connection = self.acquire(AccessMode::ReadOnly)?;
        let facts = read_table(
            &connection,
            "SELECT country, CAST(date AS VARCHAR), code, continent, population, new_cases, \
             total_cases FROM covid_facts ORDER BY country, date",
            |row| {
                Ok(Fact::new(
                    row.get::<_, String>(0)?,
                    date_at(row, 1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            },
        )?;
        let deaths = read_table(
            &connection,
            "SELECT country, CAST(date AS VARCHAR), new_deaths, total_deaths \
             FROM covid_deaths ORDER BY country, date",
            |row| {
                Ok(DeathRecord::new(
                    row.get::<_, String>(0)?,
                    date_at(row, 1)?,
                    row.get(2)?,
                    row.get(3)?,
                ))
            },
        )?;
        let vaccinations = read_table(
            &connection,
            "SELECT country, CAST(date AS VARCHAR), new_vaccinations, total_vaccinations \
             FROM covid_vaccinations ORDER BY country, date",
            |row| {
                Ok(VaccinationRecord::new(
                    row.get::<_, String>(0)?,
                    date_at(row, 1)?,
                    row.get(2)?,
                    row.get(3)?,
                ))
            },
        )?;

        let facts = collect_valid("covid_facts", facts)?;
        let deaths = collect_valid("covid_deaths", deaths)?;
        let vaccinations = collect_valid("covid_vaccinations", vaccinations)?;
        NormalizedTables::new(facts, deaths, vaccinations).map_err(|error| {
            WarehouseError::InvalidRow {
                view: "normalized tables",
                message: error.to_string(),
            }
        })
    }

    fn read_view<T>(
        &self,
        view: ReportView,
        columns: &str,
        map: impl FnMut(&Row<'_>) -> Result<T, ::duckdb::Error>,
    ) -> Result<Vec<T>, WarehouseError> {
        let connection = self.acquire(AccessMode::ReadOnly)?;
        let sql = format!(
            "SELECT {columns} FROM {view} ORDER BY {order}",
            view = view.sql_view(),
            order = view.order_by(),
        );
        read_table(&connection, &sql, map)
    }
}

fn read_table<T>(
    connection: &Connection,
    sql: &str,
    mut map: impl FnMut(&Row<'_>) -> Result<T, ::duckdb::Error>,
) -> Result<Vec<T>, WarehouseError> {
    let mut statement = connection.prepare(sql)?;
    let mut rows = statement.query([] as [&dyn ToSql; 0])?;
    let mut output = Vec::new();
    while let Some(row) = rows.next()? {
        output.push(map(row)?);
    }
    Ok(output)
}

fn collect_valid<T>(
    table: &'static str,
    records: Vec<Result<T, epistat_core::ValidationError>>,
) -> Result<Vec<T>, WarehouseError> {
    records
        .into_iter()
        .map(|record| {
            record.map_err(|error| WarehouseError::InvalidRow {
                view: table,
                message: error.to_string(),
            })
        })
        .collect()
}

/// Dates are selected as ISO text and parsed into [`ReportDate`].
fn date_at(row: &Row<'_>, index: usize) -> Result<ReportDate, ::duckdb::Error> {
    let text: String = row.get(index)?;
    ReportDate::parse(&text).map_err(|error| {
        ::duckdb::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}
