//! In-memory normalizer: projects the wide source feeds onto the three keyed
//! tables and joins them back on `(country, date)`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{CoreError, DeathRecord, Fact, RecordKey, ReportDate, VaccinationRecord};

/// Table names used in duplicate-key errors, matching the warehouse tables.
pub const FACTS_TABLE: &str = "covid_facts";
pub const DEATHS_TABLE: &str = "covid_deaths";
pub const VACCINATIONS_TABLE: &str = "covid_vaccinations";

/// One row of the wide case/death feed, named as the source publishes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCovidRow {
    pub location: String,
    pub date: ReportDate,
    pub iso_code: Option<String>,
    pub continent: Option<String>,
    pub population: Option<i64>,
    pub new_cases: Option<i64>,
    pub total_cases: Option<i64>,
    pub new_deaths: Option<i64>,
    pub total_deaths: Option<i64>,
}

/// One row of the vaccination feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVaccinationRow {
    pub location: String,
    pub date: ReportDate,
    pub new_vaccinations: Option<i64>,
    pub total_vaccinations: Option<i64>,
}

/// Project the raw feeds onto the normalized tables.
///
/// `facts_feed` and `deaths_feed` are usually the same combined feed. Values
/// pass through unchanged; only columns are selected and renamed.
pub fn normalize(
    facts_feed: &[RawCovidRow],
    deaths_feed: &[RawCovidRow],
    vaccinations_feed: &[RawVaccinationRow],
) -> Result<NormalizedTables, CoreError> {
    let facts = facts_feed
        .iter()
        .map(|row| {
            Fact::new(
                row.location.as_str(),
                row.date,
                row.iso_code.clone(),
                row.continent.clone(),
                row.population,
                row.new_cases,
                row.total_cases,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let deaths = deaths_feed
        .iter()
        .map(|row| {
            DeathRecord::new(
                row.location.as_str(),
                row.date,
                row.new_deaths,
                row.total_deaths,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let vaccinations = vaccinations_feed
        .iter()
        .map(|row| {
            VaccinationRecord::new(
                row.location.as_str(),
                row.date,
                row.new_vaccinations,
                row.total_vaccinations,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    NormalizedTables::new(facts, deaths, vaccinations)
}

/// The three normalized tables, each sorted by `(country, date)` and free of
/// duplicate keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTables {
    facts: Vec<Fact>,
    deaths: Vec<DeathRecord>,
    vaccinations: Vec<VaccinationRecord>,
}

impl NormalizedTables {
    pub fn new(
        mut facts: Vec<Fact>,
        mut deaths: Vec<DeathRecord>,
        mut vaccinations: Vec<VaccinationRecord>,
    ) -> Result<Self, CoreError> {
        facts.sort_by(|a, b| (&a.country, a.date).cmp(&(&b.country, b.date)));
        deaths.sort_by(|a, b| (&a.country, a.date).cmp(&(&b.country, b.date)));
        vaccinations.sort_by(|a, b| (&a.country, a.date).cmp(&(&b.country, b.date)));

        ensure_unique(FACTS_TABLE, facts.iter().map(Fact::key))?;
        ensure_unique(DEATHS_TABLE, deaths.iter().map(DeathRecord::key))?;
        ensure_unique(
            VACCINATIONS_TABLE,
            vaccinations.iter().map(VaccinationRecord::key),
        )?;

        Ok(Self {
            facts,
            deaths,
            vaccinations,
        })
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn deaths(&self) -> &[DeathRecord] {
        &self.deaths
    }

    pub fn vaccinations(&self) -> &[VaccinationRecord] {
        &self.vaccinations
    }

    /// Inner join of facts and death records. Keys missing on either side
    /// are dropped. Output follows death-record key order.
    pub fn fact_deaths(&self) -> Vec<(&Fact, &DeathRecord)> {
        let facts = self.facts_by_key();
        self.deaths
            .iter()
            .filter_map(|record| {
                facts
                    .get(&(record.country.as_str(), record.date))
                    .map(|fact| (*fact, record))
            })
            .collect()
    }

    /// Inner join of facts and vaccination records, in key order.
    pub fn fact_vaccinations(&self) -> Vec<(&Fact, &VaccinationRecord)> {
        let facts = self.facts_by_key();
        self.vaccinations
            .iter()
            .filter_map(|record| {
                facts
                    .get(&(record.country.as_str(), record.date))
                    .map(|fact| (*fact, record))
            })
            .collect()
    }

    fn facts_by_key(&self) -> HashMap<(&str, ReportDate), &Fact> {
        self.facts
            .iter()
            .map(|fact| ((fact.country.as_str(), fact.date), fact))
            .collect()
    }
}

/// Keys must arrive sorted so duplicates are adjacent.
fn ensure_unique(
    table: &'static str,
    keys: impl Iterator<Item = RecordKey>,
) -> Result<(), CoreError> {
    let mut previous: Option<RecordKey> = None;
    for key in keys {
        if previous.as_ref() == Some(&key) {
            return Err(CoreError::DuplicateKey {
                table,
                country: key.country,
                date: key.date.format_iso(),
            });
        }
        previous = Some(key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(value: &str) -> ReportDate {
        ReportDate::parse(value).expect("valid date")
    }

    fn raw(location: &str, date: &str, total_cases: i64, total_deaths: i64) -> RawCovidRow {
        RawCovidRow {
            location: location.to_owned(),
            date: day(date),
            iso_code: Some(String::from("XXX")),
            continent: Some(String::from("Europe")),
            population: Some(1_000),
            new_cases: Some(1),
            total_cases: Some(total_cases),
            new_deaths: Some(0),
            total_deaths: Some(total_deaths),
        }
    }

    #[test]
    fn projects_and_renames_without_transforming_values() {
        let feed = vec![raw("Norway", "2021-01-01", 200, 10)];
        let tables = normalize(&feed, &feed, &[]).expect("normalize");

        let fact = &tables.facts()[0];
        assert_eq!(fact.country, "Norway");
        assert_eq!(fact.code.as_deref(), Some("XXX"));
        assert_eq!(fact.total_cases, Some(200));
        assert_eq!(tables.deaths()[0].total_deaths, Some(10));
        assert!(tables.vaccinations().is_empty());
    }

    #[test]
    fn duplicate_keys_fail_the_load() {
        let feed = vec![
            raw("Norway", "2021-01-01", 200, 10),
            raw("Norway", "2021-01-01", 201, 10),
        ];
        let error = normalize(&feed, &[], &[]).expect_err("duplicate key");
        match error {
            CoreError::DuplicateKey {
                table,
                country,
                date,
            } => {
                assert_eq!(table, FACTS_TABLE);
                assert_eq!(country, "Norway");
                assert_eq!(date, "2021-01-01");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn joins_drop_keys_missing_on_either_side() {
        let facts_feed = vec![
            raw("Norway", "2021-01-01", 1, 0),
            raw("Norway", "2021-01-02", 2, 0),
        ];
        let deaths_feed = vec![
            raw("Norway", "2021-01-02", 2, 0),
            raw("Norway", "2021-01-03", 3, 0),
        ];
        let tables = normalize(&facts_feed, &deaths_feed, &[]).expect("normalize");

        let joined = tables.fact_deaths();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].0.date, day("2021-01-02"));
    }
}
