use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// The eleven named reporting views derived from the normalized tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportView {
    MaxMortalityRate,
    InfectedRate,
    PeakInfectedRate,
    TotalDeathsOverTime,
    RegionTotalDeathsOverTime,
    ContinentTotalDeathsOverTime,
    CountryFinalCasesDeathsMortality,
    GlobalCasesDeathsMortality,
    GlobalFinalCasesDeathsMortality,
    CountryVacsRollingCount,
    DailyPercentageVaccinated,
}

impl ReportView {
    pub const ALL: [Self; 11] = [
        Self::MaxMortalityRate,
        Self::InfectedRate,
        Self::PeakInfectedRate,
        Self::TotalDeathsOverTime,
        Self::RegionTotalDeathsOverTime,
        Self::ContinentTotalDeathsOverTime,
        Self::CountryFinalCasesDeathsMortality,
        Self::GlobalCasesDeathsMortality,
        Self::GlobalFinalCasesDeathsMortality,
        Self::CountryVacsRollingCount,
        Self::DailyPercentageVaccinated,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MaxMortalityRate => "MaxMortalityRate",
            Self::InfectedRate => "InfectedRate",
            Self::PeakInfectedRate => "PeakInfectedRate",
            Self::TotalDeathsOverTime => "TotalDeathsOverTime",
            Self::RegionTotalDeathsOverTime => "RegionTotalDeathsOverTime",
            Self::ContinentTotalDeathsOverTime => "ContinentTotalDeathsOverTime",
            Self::CountryFinalCasesDeathsMortality => "CountryFinalCasesDeathsMortality",
            Self::GlobalCasesDeathsMortality => "GlobalCasesDeathsMortality",
            Self::GlobalFinalCasesDeathsMortality => "GlobalFinalCasesDeathsMortality",
            Self::CountryVacsRollingCount => "CountryVacsRollingCount",
            Self::DailyPercentageVaccinated => "DailyPercentageVaccinated",
        }
    }

    /// Name of the SQL view backing this report in the warehouse.
    pub const fn sql_view(self) -> &'static str {
        match self {
            Self::MaxMortalityRate => "vw_max_mortality_rate",
            Self::InfectedRate => "vw_infected_rate",
            Self::PeakInfectedRate => "vw_peak_infected_rate",
            Self::TotalDeathsOverTime => "vw_total_deaths_over_time",
            Self::RegionTotalDeathsOverTime => "vw_region_total_deaths_over_time",
            Self::ContinentTotalDeathsOverTime => "vw_continent_total_deaths_over_time",
            Self::CountryFinalCasesDeathsMortality => "vw_country_final_cases_deaths_mortality",
            Self::GlobalCasesDeathsMortality => "vw_global_cases_deaths_mortality",
            Self::GlobalFinalCasesDeathsMortality => "vw_global_final_cases_deaths_mortality",
            Self::CountryVacsRollingCount => "vw_country_vacs_rolling_count",
            Self::DailyPercentageVaccinated => "vw_daily_percentage_vaccinated",
        }
    }

    /// Stable ordering applied when the view is read back.
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::MaxMortalityRate => "max_mortality_rate DESC, country",
            Self::InfectedRate
            | Self::CountryVacsRollingCount
            | Self::DailyPercentageVaccinated => "country, date",
            Self::PeakInfectedRate => "peak_infection_rate DESC NULLS LAST, country",
            Self::TotalDeathsOverTime => "total_deaths DESC NULLS LAST, country",
            Self::RegionTotalDeathsOverTime => "total_deaths DESC NULLS LAST, region",
            Self::ContinentTotalDeathsOverTime => "total_deaths DESC NULLS LAST, continent",
            Self::CountryFinalCasesDeathsMortality => "country",
            Self::GlobalCasesDeathsMortality => "date",
            Self::GlobalFinalCasesDeathsMortality => "total_cases",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::MaxMortalityRate => "Highest daily deaths-per-case percentage per country",
            Self::InfectedRate => "Cumulative cases as a percentage of population per day",
            Self::PeakInfectedRate => "Infection rate at each country's peak case count",
            Self::TotalDeathsOverTime => "Latest cumulative deaths per country",
            Self::RegionTotalDeathsOverTime => "Latest cumulative deaths per source-feed region",
            Self::ContinentTotalDeathsOverTime => "Highest cumulative deaths within each continent",
            Self::CountryFinalCasesDeathsMortality => {
                "Final cases, deaths, and mortality rate per country"
            }
            Self::GlobalCasesDeathsMortality => "Daily global new cases, new deaths, and their ratio",
            Self::GlobalFinalCasesDeathsMortality => {
                "Grand total of per-country final cases and deaths"
            }
            Self::CountryVacsRollingCount => "Running total of new vaccinations per country",
            Self::DailyPercentageVaccinated => "Running vaccinations as a percentage of population",
        }
    }
}

impl Display for ReportView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportView {
    type Err = ValidationError;

    /// Accepts the report name case-insensitively, or the SQL view name.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        Self::ALL
            .into_iter()
            .find(|view| {
                view.as_str().eq_ignore_ascii_case(needle)
                    || view.sql_view().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| ValidationError::UnknownView {
                value: needle.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_report_and_sql_names() {
        assert_eq!(
            ReportView::from_str("infectedrate").expect("must parse"),
            ReportView::InfectedRate
        );
        assert_eq!(
            ReportView::from_str("vw_daily_percentage_vaccinated").expect("must parse"),
            ReportView::DailyPercentageVaccinated
        );
    }

    #[test]
    fn rejects_unknown_view() {
        let err = ReportView::from_str("DeathsByWeekday").expect_err("must fail");
        assert!(matches!(err, ValidationError::UnknownView { .. }));
    }

    #[test]
    fn sql_view_names_are_unique() {
        let mut names = ReportView::ALL.map(ReportView::sql_view).to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ReportView::ALL.len());
    }
}
