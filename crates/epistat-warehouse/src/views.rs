//! Rate macros and the named reporting views.
//!
//! Every view reads the normalized tables through an inner join on
//! `(country, date)`, so a row present in only one table drops out silently.

use ::duckdb::Connection;
use epistat_core::ReportView;
use tracing::debug;

/// Create the three rate formulas as SQL macros.
///
/// Arguments are cast to `DOUBLE` so integer division never truncates.
/// `mortality_rate` guards its denominator; the two population rates do not.
///
/// # Errors
/// Returns an error if the macro creation SQL fails to execute.
pub fn create_rate_macros(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r"
CREATE OR REPLACE MACRO mortality_rate(deaths, cases) AS
    CASE
        WHEN cases IS NULL OR cases = 0 THEN 0.0::DOUBLE
        ELSE ROUND(COALESCE(deaths, 0)::DOUBLE / cases::DOUBLE * 100, 2)
    END;

CREATE OR REPLACE MACRO infection_rate(cases, population) AS
    ROUND(cases::DOUBLE / population::DOUBLE * 100, 3);

CREATE OR REPLACE MACRO vaccinated_percentage(rolling, population) AS
    ROUND(rolling::DOUBLE / population::DOUBLE * 100, 2);
",
    )
}

/// Create (or replace) every reporting view.
///
/// Views are created in dependency order: the global final view reads the
/// per-country finals and the percentage view reads the rolling counts.
///
/// # Errors
/// Returns an error if any view fails to bind.
pub fn create_views(connection: &Connection) -> Result<(), ::duckdb::Error> {
    create_rate_macros(connection)?;
    for view in ReportView::ALL {
        connection.execute_batch(&format!(
            "CREATE OR REPLACE VIEW {name} AS\n{body};",
            name = view.sql_view(),
            body = view_body(view),
        ))?;
        debug!(view = view.sql_view(), "created view");
    }
    Ok(())
}

/// `SELECT` body of the SQL view backing `view`.
pub const fn view_body(view: ReportView) -> &'static str {
    match view {
        ReportView::MaxMortalityRate => {
            r"
SELECT
    f.country,
    MAX(mortality_rate(d.total_deaths, f.total_cases)) AS max_mortality_rate
FROM covid_facts f
JOIN covid_deaths d ON f.country = d.country AND f.date = d.date
WHERE f.continent IS NOT NULL
GROUP BY f.country"
        }
        ReportView::InfectedRate => {
            r"
SELECT
    country,
    date,
    population,
    total_cases,
    infection_rate(total_cases, population) AS infection_rate
FROM covid_facts
WHERE continent IS NOT NULL"
        }
        ReportView::PeakInfectedRate => {
            r"
SELECT
    country,
    population,
    date,
    total_cases AS peak_total_cases,
    infection_rate(total_cases, population) AS peak_infection_rate
FROM (
    SELECT
        country,
        population,
        date,
        total_cases,
        ROW_NUMBER() OVER (PARTITION BY country ORDER BY total_cases DESC, date) AS peak_rank
    FROM covid_facts
    WHERE continent IS NOT NULL AND total_cases IS NOT NULL
)
WHERE peak_rank = 1"
        }
        ReportView::TotalDeathsOverTime => {
            r"
SELECT
    f.country,
    MAX(d.total_deaths) AS total_deaths
FROM covid_facts f
JOIN covid_deaths d ON f.country = d.country AND f.date = d.date
WHERE f.continent IS NOT NULL
GROUP BY f.country"
        }
        ReportView::RegionTotalDeathsOverTime => {
            r"
SELECT
    f.country AS region,
    MAX(d.total_deaths) AS total_deaths
FROM covid_facts f
JOIN covid_deaths d ON f.country = d.country AND f.date = d.date
WHERE f.continent IS NULL
GROUP BY f.country"
        }
        ReportView::ContinentTotalDeathsOverTime => {
            r"
SELECT
    f.continent,
    MAX(d.total_deaths) AS total_deaths
FROM covid_facts f
JOIN covid_deaths d ON f.country = d.country AND f.date = d.date
WHERE f.continent IS NOT NULL
GROUP BY f.continent"
        }
        ReportView::CountryFinalCasesDeathsMortality => {
            r"
SELECT
    country,
    total_cases,
    total_deaths,
    mortality_rate(total_deaths, total_cases) AS mortality_rate
FROM (
    SELECT
        f.country,
        MAX(f.total_cases) AS total_cases,
        MAX(d.total_deaths) AS total_deaths
    FROM covid_facts f
    JOIN covid_deaths d ON f.country = d.country AND f.date = d.date
    WHERE f.continent IS NOT NULL
    GROUP BY f.country
)"
        }
        ReportView::GlobalCasesDeathsMortality => {
            r"
SELECT
    f.date,
    SUM(f.new_cases)::BIGINT AS new_cases,
    SUM(d.new_deaths)::BIGINT AS new_deaths,
    mortality_rate(SUM(d.new_deaths), SUM(f.new_cases)) AS mortality_rate
FROM covid_facts f
JOIN covid_deaths d ON f.country = d.country AND f.date = d.date
WHERE f.continent IS NOT NULL
GROUP BY f.date"
        }
        ReportView::GlobalFinalCasesDeathsMortality => {
            r"
SELECT
    SUM(total_cases)::BIGINT AS total_cases,
    SUM(total_deaths)::BIGINT AS total_deaths,
    mortality_rate(SUM(total_deaths), SUM(total_cases)) AS mortality_rate
FROM vw_country_final_cases_deaths_mortality"
        }
        ReportView::CountryVacsRollingCount => {
            r"
SELECT
    f.continent,
    v.country,
    v.date,
    f.population,
    v.new_vaccinations,
    SUM(v.new_vaccinations) OVER (
        PARTITION BY v.country
        ORDER BY v.date
        ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW
    )::BIGINT AS rolling_vaccinations
FROM covid_facts f
JOIN covid_vaccinations v ON f.country = v.country AND f.date = v.date
WHERE f.continent IS NOT NULL AND v.new_vaccinations IS NOT NULL"
        }
        ReportView::DailyPercentageVaccinated => {
            r"
SELECT
    country,
    date,
    population,
    rolling_vaccinations,
    vaccinated_percentage(rolling_vaccinations, population) AS percentage_vaccinated
FROM vw_country_vacs_rolling_count"
        }
    }
}
