//! The whole reporting pipeline as one pure function: normalized tables in,
//! every named view out.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::aggregate::{self, LatestBy};
use crate::rolling;
use crate::{
    ContinentDeathsRow, CoreError, CountryDeathsRow, CountryFinalRow, GlobalDailyRow,
    GlobalFinalRow, InfectionRateRow, MortalityRateRow, NormalizedTables, PeakInfectionRow,
    RegionDeathsRow, ReportView, RollingVaccinationRow, VaccinatedPercentageRow,
};

/// Rows of all eleven views, computed from one set of normalized tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSet {
    pub max_mortality_rate: Vec<MortalityRateRow>,
    pub infected_rate: Vec<InfectionRateRow>,
    pub peak_infected_rate: Vec<PeakInfectionRow>,
    pub total_deaths_over_time: Vec<CountryDeathsRow>,
    pub region_total_deaths_over_time: Vec<RegionDeathsRow>,
    pub continent_total_deaths_over_time: Vec<ContinentDeathsRow>,
    pub country_final_cases_deaths_mortality: Vec<CountryFinalRow>,
    pub global_cases_deaths_mortality: Vec<GlobalDailyRow>,
    pub global_final_cases_deaths_mortality: GlobalFinalRow,
    pub country_vacs_rolling_count: Vec<RollingVaccinationRow>,
    pub daily_percentage_vaccinated: Vec<VaccinatedPercentageRow>,
}

impl ReportSet {
    /// Compute every view with the default `LatestBy::Max` semantics.
    ///
    /// # Errors
    /// Fails with [`CoreError::Rate`] when a country row has a zero or
    /// missing population, since its infection and vaccination percentages
    /// are undefined.
    pub fn compute(tables: &NormalizedTables) -> Result<Self, CoreError> {
        Self::compute_with(tables, LatestBy::Max)
    }

    pub fn compute_with(tables: &NormalizedTables, latest: LatestBy) -> Result<Self, CoreError> {
        let country_finals = aggregate::country_finals(tables, latest);
        let global_final = aggregate::global_final(&country_finals);
        let rolling = rolling::rolling_vaccinations(tables);
        let percentages = rolling::vaccinated_percentages(&rolling)?;

        let report = Self {
            max_mortality_rate: aggregate::max_mortality_rates(tables),
            infected_rate: aggregate::infection_rates(tables)?,
            peak_infected_rate: aggregate::peak_infection_rates(tables)?,
            total_deaths_over_time: aggregate::country_total_deaths(tables, latest),
            region_total_deaths_over_time: aggregate::region_total_deaths(tables),
            continent_total_deaths_over_time: aggregate::continent_total_deaths(tables),
            country_final_cases_deaths_mortality: country_finals,
            global_cases_deaths_mortality: aggregate::global_daily(tables),
            global_final_cases_deaths_mortality: global_final,
            country_vacs_rolling_count: rolling,
            daily_percentage_vaccinated: percentages,
        };

        debug!(
            facts = tables.facts().len(),
            deaths = tables.deaths().len(),
            vaccinations = tables.vaccinations().len(),
            countries = report.country_final_cases_deaths_mortality.len(),
            "computed report set"
        );

        Ok(report)
    }

    /// Compute one view alone, as a JSON array.
    ///
    /// Unlike [`ReportSet::compute`], an undefined population only fails the
    /// views that divide by it (`InfectedRate`, `PeakInfectedRate`,
    /// `DailyPercentageVaccinated`).
    pub fn compute_view(
        tables: &NormalizedTables,
        view: ReportView,
        latest: LatestBy,
    ) -> Result<Value, CoreError> {
        let rows = match view {
            ReportView::MaxMortalityRate => {
                serde_json::to_value(aggregate::max_mortality_rates(tables))
            }
            ReportView::InfectedRate => serde_json::to_value(aggregate::infection_rates(tables)?),
            ReportView::PeakInfectedRate => {
                serde_json::to_value(aggregate::peak_infection_rates(tables)?)
            }
            ReportView::TotalDeathsOverTime => {
                serde_json::to_value(aggregate::country_total_deaths(tables, latest))
            }
            ReportView::RegionTotalDeathsOverTime => {
                serde_json::to_value(aggregate::region_total_deaths(tables))
            }
            ReportView::ContinentTotalDeathsOverTime => {
                serde_json::to_value(aggregate::continent_total_deaths(tables))
            }
            ReportView::CountryFinalCasesDeathsMortality => {
                serde_json::to_value(aggregate::country_finals(tables, latest))
            }
            ReportView::GlobalCasesDeathsMortality => {
                serde_json::to_value(aggregate::global_daily(tables))
            }
            ReportView::GlobalFinalCasesDeathsMortality => {
                let finals = aggregate::country_finals(tables, latest);
                serde_json::to_value([aggregate::global_final(&finals)])
            }
            ReportView::CountryVacsRollingCount => {
                serde_json::to_value(rolling::rolling_vaccinations(tables))
            }
            ReportView::DailyPercentageVaccinated => {
                let rolling = rolling::rolling_vaccinations(tables);
                serde_json::to_value(rolling::vaccinated_percentages(&rolling)?)
            }
        }?;

        debug!(view = view.as_str(), "computed single view");
        Ok(rows)
    }

    /// Rows of one view as a JSON array.
    pub fn view_json(&self, view: ReportView) -> Result<Value, serde_json::Error> {
        match view {
            ReportView::MaxMortalityRate => serde_json::to_value(&self.max_mortality_rate),
            ReportView::InfectedRate => serde_json::to_value(&self.infected_rate),
            ReportView::PeakInfectedRate => serde_json::to_value(&self.peak_infected_rate),
            ReportView::TotalDeathsOverTime => serde_json::to_value(&self.total_deaths_over_time),
            ReportView::RegionTotalDeathsOverTime => {
                serde_json::to_value(&self.region_total_deaths_over_time)
            }
            ReportView::ContinentTotalDeathsOverTime => {
                serde_json::to_value(&self.continent_total_deaths_over_time)
            }
            ReportView::CountryFinalCasesDeathsMortality => {
                serde_json::to_value(&self.country_final_cases_deaths_mortality)
            }
            ReportView::GlobalCasesDeathsMortality => {
                serde_json::to_value(&self.global_cases_deaths_mortality)
            }
            ReportView::GlobalFinalCasesDeathsMortality => {
                serde_json::to_value([&self.global_final_cases_deaths_mortality])
            }
            ReportView::CountryVacsRollingCount => {
                serde_json::to_value(&self.country_vacs_rolling_count)
            }
            ReportView::DailyPercentageVaccinated => {
                serde_json::to_value(&self.daily_percentage_vaccinated)
            }
        }
    }
}
