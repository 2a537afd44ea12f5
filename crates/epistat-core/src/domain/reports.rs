use serde::{Deserialize, Serialize};

use crate::ReportDate;

/// `MaxMortalityRate`: highest per-day mortality rate seen for a country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortalityRateRow {
    pub country: String,
    pub max_mortality_rate: f64,
}

/// `InfectedRate`: share of the population infected on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfectionRateRow {
    pub country: String,
    pub date: ReportDate,
    pub population: Option<i64>,
    pub total_cases: Option<i64>,
    pub infection_rate: Option<f64>,
}

/// `PeakInfectedRate`: infection rate at the first day a country reached its
/// highest cumulative case count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakInfectionRow {
    pub country: String,
    pub population: Option<i64>,
    pub date: ReportDate,
    pub peak_total_cases: i64,
    pub peak_infection_rate: Option<f64>,
}

/// `TotalDeathsOverTime`: latest (maximum) cumulative deaths per country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryDeathsRow {
    pub country: String,
    pub total_deaths: Option<i64>,
}

/// `RegionTotalDeathsOverTime`: cumulative deaths of a source-feed region row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDeathsRow {
    pub region: String,
    pub total_deaths: Option<i64>,
}

/// `ContinentTotalDeathsOverTime`: maximum cumulative deaths within a continent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinentDeathsRow {
    pub continent: String,
    pub total_deaths: Option<i64>,
}

/// `CountryFinalCasesDeathsMortality`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryFinalRow {
    pub country: String,
    pub total_cases: Option<i64>,
    pub total_deaths: Option<i64>,
    pub mortality_rate: f64,
}

/// `GlobalCasesDeathsMortality`: same-day new deaths over new cases, summed
/// across countries. A crude ratio, not a cohort mortality rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalDailyRow {
    pub date: ReportDate,
    pub new_cases: Option<i64>,
    pub new_deaths: Option<i64>,
    pub mortality_rate: f64,
}

/// `GlobalFinalCasesDeathsMortality`: grand totals of per-country finals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalFinalRow {
    pub total_cases: Option<i64>,
    pub total_deaths: Option<i64>,
    pub mortality_rate: f64,
}

/// `CountryVacsRollingCount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingVaccinationRow {
    pub continent: String,
    pub country: String,
    pub date: ReportDate,
    pub population: Option<i64>,
    pub new_vaccinations: i64,
    pub rolling_vaccinations: i64,
}

/// `DailyPercentageVaccinated`. Values above 100 are expected once booster
/// doses accumulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinatedPercentageRow {
    pub country: String,
    pub date: ReportDate,
    pub population: Option<i64>,
    pub rolling_vaccinations: i64,
    pub percentage_vaccinated: Option<f64>,
}
