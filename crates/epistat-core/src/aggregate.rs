//! Country, continent, region, and global aggregations over the normalized
//! tables.
//!
//! Country and continent shapes skip region pseudo-rows (no continent); the
//! region shape keeps only those rows.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::rates::{infection_rate, mortality_rate};
use crate::{
    ContinentDeathsRow, CountryDeathsRow, CountryFinalRow, DeathRecord, Fact, GlobalDailyRow,
    GlobalFinalRow, InfectionRateRow, MortalityRateRow, NormalizedTables, PeakInfectionRow,
    RateError, RegionDeathsRow, ReportDate,
};

/// How a country's "latest" cumulative total is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LatestBy {
    /// Largest observed value. Equals the latest value as long as the feed's
    /// running totals never decrease.
    #[default]
    Max,
    /// Value reported on the country's most recent date, which may be null.
    Date,
}

/// `MaxMortalityRate`.
pub fn max_mortality_rates(tables: &NormalizedTables) -> Vec<MortalityRateRow> {
    let mut by_country: BTreeMap<&str, f64> = BTreeMap::new();
    for (fact, deaths) in country_rows(tables) {
        let rate = mortality_rate(deaths.total_deaths, fact.total_cases);
        by_country
            .entry(fact.country.as_str())
            .and_modify(|max| *max = max.max(rate))
            .or_insert(rate);
    }

    let mut rows: Vec<_> = by_country
        .into_iter()
        .map(|(country, max_mortality_rate)| MortalityRateRow {
            country: country.to_owned(),
            max_mortality_rate,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.max_mortality_rate
            .total_cmp(&a.max_mortality_rate)
            .then_with(|| a.country.cmp(&b.country))
    });
    rows
}

/// `InfectedRate`: one row per country fact.
pub fn infection_rates(tables: &NormalizedTables) -> Result<Vec<InfectionRateRow>, RateError> {
    tables
        .facts()
        .iter()
        .filter(|fact| !fact.is_region())
        .map(|fact| {
            Ok(InfectionRateRow {
                country: fact.country.clone(),
                date: fact.date,
                population: fact.population,
                total_cases: fact.total_cases,
                infection_rate: infection_rate(fact.total_cases, fact.population)?,
            })
        })
        .collect()
}

/// `PeakInfectedRate`. Ties on the peak case count resolve to the earliest
/// date. Countries that never reported cases have no peak and no row.
pub fn peak_infection_rates(
    tables: &NormalizedTables,
) -> Result<Vec<PeakInfectionRow>, RateError> {
    let mut peaks: BTreeMap<&str, &Fact> = BTreeMap::new();
    for fact in tables.facts().iter().filter(|fact| !fact.is_region()) {
        let Some(cases) = fact.total_cases else {
            continue;
        };
        peaks
            .entry(fact.country.as_str())
            .and_modify(|peak| {
                let peak_cases = peak.total_cases.unwrap_or(i64::MIN);
                if cases > peak_cases || (cases == peak_cases && fact.date < peak.date) {
                    *peak = fact;
                }
            })
            .or_insert(fact);
    }

    let mut rows = peaks
        .into_values()
        .map(|fact| {
            let peak_total_cases = fact.total_cases.unwrap_or_default();
            Ok(PeakInfectionRow {
                country: fact.country.clone(),
                population: fact.population,
                date: fact.date,
                peak_total_cases,
                peak_infection_rate: infection_rate(Some(peak_total_cases), fact.population)?,
            })
        })
        .collect::<Result<Vec<_>, RateError>>()?;
    rows.sort_by(|a, b| {
        desc_nulls_last_f64(a.peak_infection_rate, b.peak_infection_rate)
            .then_with(|| a.country.cmp(&b.country))
    });
    Ok(rows)
}

/// `TotalDeathsOverTime`.
pub fn country_total_deaths(tables: &NormalizedTables, latest: LatestBy) -> Vec<CountryDeathsRow> {
    let mut rows: Vec<_> = latest_by_country(tables, latest)
        .into_iter()
        .map(|(country, totals)| CountryDeathsRow {
            country: country.to_owned(),
            total_deaths: totals.deaths,
        })
        .collect();
    rows.sort_by(|a, b| {
        desc_nulls_last(a.total_deaths, b.total_deaths).then_with(|| a.country.cmp(&b.country))
    });
    rows
}

/// `RegionTotalDeathsOverTime`: region pseudo-rows only, each region
/// treated as its own group.
pub fn region_total_deaths(tables: &NormalizedTables) -> Vec<RegionDeathsRow> {
    let mut by_region: BTreeMap<&str, Option<i64>> = BTreeMap::new();
    for (fact, deaths) in tables.fact_deaths() {
        if !fact.is_region() {
            continue;
        }
        let entry = by_region.entry(fact.country.as_str()).or_insert(None);
        *entry = max_present(*entry, deaths.total_deaths);
    }

    let mut rows: Vec<_> = by_region
        .into_iter()
        .map(|(region, total_deaths)| RegionDeathsRow {
            region: region.to_owned(),
            total_deaths,
        })
        .collect();
    rows.sort_by(|a, b| {
        desc_nulls_last(a.total_deaths, b.total_deaths).then_with(|| a.region.cmp(&b.region))
    });
    rows
}

/// `ContinentTotalDeathsOverTime`: the largest cumulative death count of any
/// row in the continent.
pub fn continent_total_deaths(tables: &NormalizedTables) -> Vec<ContinentDeathsRow> {
    let mut by_continent: BTreeMap<&str, Option<i64>> = BTreeMap::new();
    for (fact, deaths) in country_rows(tables) {
        let Some(continent) = fact.continent.as_deref() else {
            continue;
        };
        let entry = by_continent.entry(continent).or_insert(None);
        *entry = max_present(*entry, deaths.total_deaths);
    }

    let mut rows: Vec<_> = by_continent
        .into_iter()
        .map(|(continent, total_deaths)| ContinentDeathsRow {
            continent: continent.to_owned(),
            total_deaths,
        })
        .collect();
    rows.sort_by(|a, b| {
        desc_nulls_last(a.total_deaths, b.total_deaths)
            .then_with(|| a.continent.cmp(&b.continent))
    });
    rows
}

/// `CountryFinalCasesDeathsMortality`, ordered by country.
pub fn country_finals(tables: &NormalizedTables, latest: LatestBy) -> Vec<CountryFinalRow> {
    latest_by_country(tables, latest)
        .into_iter()
        .map(|(country, totals)| CountryFinalRow {
            country: country.to_owned(),
            total_cases: totals.cases,
            total_deaths: totals.deaths,
            mortality_rate: mortality_rate(totals.deaths, totals.cases),
        })
        .collect()
}

/// `GlobalCasesDeathsMortality`: new cases and deaths summed per date.
pub fn global_daily(tables: &NormalizedTables) -> Vec<GlobalDailyRow> {
    let mut by_date: BTreeMap<ReportDate, (Option<i64>, Option<i64>)> = BTreeMap::new();
    for (fact, deaths) in country_rows(tables) {
        let entry = by_date.entry(fact.date).or_insert((None, None));
        entry.0 = add_present(entry.0, fact.new_cases);
        entry.1 = add_present(entry.1, deaths.new_deaths);
    }

    by_date
        .into_iter()
        .map(|(date, (new_cases, new_deaths))| GlobalDailyRow {
            date,
            new_cases,
            new_deaths,
            mortality_rate: mortality_rate(new_deaths, new_cases),
        })
        .collect()
}

/// `GlobalFinalCasesDeathsMortality`: grand totals of the per-country finals.
/// Always one row; totals are null when no country reported any.
pub fn global_final(finals: &[CountryFinalRow]) -> GlobalFinalRow {
    let (total_cases, total_deaths) = finals.iter().fold((None, None), |(cases, deaths), row| {
        (
            add_present(cases, row.total_cases),
            add_present(deaths, row.total_deaths),
        )
    });

    GlobalFinalRow {
        total_cases,
        total_deaths,
        mortality_rate: mortality_rate(total_deaths, total_cases),
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct LatestTotals {
    cases: Option<i64>,
    deaths: Option<i64>,
    date: Option<ReportDate>,
}

fn latest_by_country(tables: &NormalizedTables, latest: LatestBy) -> BTreeMap<&str, LatestTotals> {
    let mut by_country: BTreeMap<&str, LatestTotals> = BTreeMap::new();
    for (fact, deaths) in country_rows(tables) {
        let entry = by_country.entry(fact.country.as_str()).or_default();
        match latest {
            LatestBy::Max => {
                entry.cases = max_present(entry.cases, fact.total_cases);
                entry.deaths = max_present(entry.deaths, deaths.total_deaths);
            }
            LatestBy::Date => {
                if entry.date.map_or(true, |date| fact.date > date) {
                    *entry = LatestTotals {
                        cases: fact.total_cases,
                        deaths: deaths.total_deaths,
                        date: Some(fact.date),
                    };
                }
            }
        }
    }
    by_country
}

fn country_rows(tables: &NormalizedTables) -> impl Iterator<Item = (&Fact, &DeathRecord)> {
    tables
        .fact_deaths()
        .into_iter()
        .filter(|(fact, _)| !fact.is_region())
}

/// `MAX` over nullable values: nulls are ignored, all-null stays null.
fn max_present(current: Option<i64>, value: Option<i64>) -> Option<i64> {
    match (current, value) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// `SUM` over nullable values: nulls are ignored, all-null stays null.
fn add_present(current: Option<i64>, value: Option<i64>) -> Option<i64> {
    match (current, value) {
        (Some(a), Some(b)) => Some(a.saturating_add(b)),
        (a, b) => a.or(b),
    }
}

fn desc_nulls_last(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn desc_nulls_last_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(value: &str) -> ReportDate {
        ReportDate::parse(value).expect("valid date")
    }

    fn fact(country: &str, continent: Option<&str>, date: &str, total_cases: Option<i64>) -> Fact {
        Fact::new(
            country,
            day(date),
            None,
            continent.map(str::to_owned),
            Some(1_000),
            Some(1),
            total_cases,
        )
        .expect("valid fact")
    }

    fn deaths(country: &str, date: &str, new: Option<i64>, total: Option<i64>) -> DeathRecord {
        DeathRecord::new(country, day(date), new, total).expect("valid record")
    }

    fn sample() -> NormalizedTables {
        NormalizedTables::new(
            vec![
                fact("Chile", Some("South America"), "2021-01-01", Some(100)),
                fact("Chile", Some("South America"), "2021-01-02", Some(200)),
                fact("Peru", Some("South America"), "2021-01-01", Some(50)),
                fact("Peru", Some("South America"), "2021-01-02", Some(50)),
                fact("Kenya", Some("Africa"), "2021-01-02", None),
                fact("World", None, "2021-01-02", Some(10_000)),
            ],
            vec![
                deaths("Chile", "2021-01-01", Some(3), Some(3)),
                deaths("Chile", "2021-01-02", Some(7), Some(10)),
                deaths("Peru", "2021-01-01", Some(1), Some(1)),
                deaths("Peru", "2021-01-02", None, Some(1)),
                deaths("Kenya", "2021-01-02", None, None),
                deaths("World", "2021-01-02", Some(40), Some(500)),
            ],
            Vec::new(),
        )
        .expect("valid tables")
    }

    #[test]
    fn country_totals_exclude_region_rows() {
        let rows = country_total_deaths(&sample(), LatestBy::Max);
        let countries: Vec<_> = rows.iter().map(|row| row.country.as_str()).collect();
        assert_eq!(countries, ["Chile", "Peru", "Kenya"]);
        assert_eq!(rows[0].total_deaths, Some(10));
        assert_eq!(rows[2].total_deaths, None);
    }

    #[test]
    fn region_totals_keep_only_region_rows() {
        let rows = region_total_deaths(&sample());
        assert_eq!(
            rows,
            vec![RegionDeathsRow {
                region: String::from("World"),
                total_deaths: Some(500),
            }]
        );
    }

    #[test]
    fn continent_totals_take_the_max_per_continent() {
        let rows = continent_total_deaths(&sample());
        assert_eq!(rows[0].continent, "South America");
        assert_eq!(rows[0].total_deaths, Some(10));
        assert_eq!(rows[1].continent, "Africa");
        assert_eq!(rows[1].total_deaths, None);
    }

    #[test]
    fn peak_ties_resolve_to_the_earliest_date() {
        let rows = peak_infection_rates(&sample()).expect("defined populations");
        let peru = rows.iter().find(|row| row.country == "Peru").expect("peru");
        assert_eq!(peru.date, day("2021-01-01"));
        assert_eq!(peru.peak_total_cases, 50);
        assert_eq!(peru.peak_infection_rate, Some(5.0));
        assert!(rows.iter().all(|row| row.country != "Kenya"));
    }

    #[test]
    fn global_daily_sums_new_counts_of_countries_only() {
        let rows = global_daily(&sample());
        assert_eq!(rows.len(), 2);
        let second = &rows[1];
        assert_eq!(second.date, day("2021-01-02"));
        assert_eq!(second.new_cases, Some(3));
        assert_eq!(second.new_deaths, Some(7));
        assert_eq!(second.mortality_rate, 233.33);
    }

    #[test]
    fn global_final_sums_per_country_maxima() {
        let finals = country_finals(&sample(), LatestBy::Max);
        let total = global_final(&finals);
        assert_eq!(total.total_cases, Some(250));
        assert_eq!(total.total_deaths, Some(11));
        assert_eq!(total.mortality_rate, 4.4);
    }

    #[test]
    fn global_final_of_nothing_is_zero_rate() {
        let total = global_final(&[]);
        assert_eq!(total.total_cases, None);
        assert_eq!(total.mortality_rate, 0.0);
    }

    #[test]
    fn latest_by_date_takes_the_last_reported_value() {
        let tables = NormalizedTables::new(
            vec![
                fact("Chile", Some("South America"), "2021-01-01", Some(300)),
                fact("Chile", Some("South America"), "2021-01-02", Some(250)),
            ],
            vec![
                deaths("Chile", "2021-01-01", None, Some(9)),
                deaths("Chile", "2021-01-02", None, Some(8)),
            ],
            Vec::new(),
        )
        .expect("valid tables");

        let by_max = country_finals(&tables, LatestBy::Max);
        assert_eq!(by_max[0].total_cases, Some(300));

        let by_date = country_finals(&tables, LatestBy::Date);
        assert_eq!(by_date[0].total_cases, Some(250));
        assert_eq!(by_date[0].total_deaths, Some(8));
    }

    #[test]
    fn max_mortality_rate_picks_the_worst_day() {
        let rows = max_mortality_rates(&sample());
        assert_eq!(rows[0].country, "Chile");
        assert_eq!(rows[0].max_mortality_rate, 5.0);
        let kenya = rows.iter().find(|row| row.country == "Kenya").expect("kenya");
        assert_eq!(kenya.max_mortality_rate, 0.0);
    }
}
