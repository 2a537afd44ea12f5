//! Per-country running total of new vaccinations.

use crate::rates::vaccinated_percentage;
use crate::{NormalizedTables, RateError, RollingVaccinationRow, VaccinatedPercentageRow};

/// `CountryVacsRollingCount`.
///
/// Rows are walked in `(country, date)` order. A row whose
/// `new_vaccinations` is null is skipped outright: it adds nothing and emits
/// nothing, so the next reported day carries the total across the gap.
pub fn rolling_vaccinations(tables: &NormalizedTables) -> Vec<RollingVaccinationRow> {
    let mut rows = Vec::new();
    let mut current: Option<(&str, i64)> = None;

    for (fact, record) in tables.fact_vaccinations() {
        let Some(continent) = fact.continent.as_deref() else {
            continue;
        };
        let Some(new_vaccinations) = record.new_vaccinations else {
            continue;
        };

        let running = match current {
            Some((country, total)) if country == record.country => {
                total.saturating_add(new_vaccinations)
            }
            _ => new_vaccinations,
        };
        current = Some((record.country.as_str(), running));

        rows.push(RollingVaccinationRow {
            continent: continent.to_owned(),
            country: record.country.clone(),
            date: record.date,
            population: fact.population,
            new_vaccinations,
            rolling_vaccinations: running,
        });
    }

    rows
}

/// `DailyPercentageVaccinated`, one row per rolling-count row.
pub fn vaccinated_percentages(
    rolling: &[RollingVaccinationRow],
) -> Result<Vec<VaccinatedPercentageRow>, RateError> {
    rolling
        .iter()
        .map(|row| {
            Ok(VaccinatedPercentageRow {
                country: row.country.clone(),
                date: row.date,
                population: row.population,
                rolling_vaccinations: row.rolling_vaccinations,
                percentage_vaccinated: Some(vaccinated_percentage(
                    row.rolling_vaccinations,
                    row.population,
                )?),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fact, ReportDate, VaccinationRecord};

    fn day(value: &str) -> ReportDate {
        ReportDate::parse(value).expect("valid date")
    }

    fn tables(country: &str, continent: Option<&str>, doses: &[Option<i64>]) -> NormalizedTables {
        let dates = ["2021-03-01", "2021-03-02", "2021-03-03", "2021-03-04"];
        let facts = doses
            .iter()
            .zip(dates)
            .map(|(_, date)| {
                Fact::new(
                    country,
                    day(date),
                    None,
                    continent.map(str::to_owned),
                    Some(100),
                    None,
                    None,
                )
                .expect("valid fact")
            })
            .collect();
        let vaccinations = doses
            .iter()
            .zip(dates)
            .map(|(dose, date)| {
                VaccinationRecord::new(country, day(date), *dose, None).expect("valid record")
            })
            .collect();
        NormalizedTables::new(facts, Vec::new(), vaccinations).expect("valid tables")
    }

    #[test]
    fn null_days_are_absent_and_the_total_carries_over() {
        let rows = rolling_vaccinations(&tables("Y", Some("Asia"), &[Some(100), None, Some(50)]));
        let dates: Vec<_> = rows.iter().map(|row| row.date).collect();
        assert_eq!(dates, [day("2021-03-01"), day("2021-03-03")]);
        let totals: Vec<_> = rows.iter().map(|row| row.rolling_vaccinations).collect();
        assert_eq!(totals, [100, 150]);
    }

    #[test]
    fn running_total_restarts_per_country() {
        let mut facts = tables("A", Some("Asia"), &[Some(5), Some(5)]).facts().to_vec();
        let mut vaccinations = tables("A", Some("Asia"), &[Some(5), Some(5)])
            .vaccinations()
            .to_vec();
        let other = tables("B", Some("Asia"), &[Some(7)]);
        facts.extend_from_slice(other.facts());
        vaccinations.extend_from_slice(other.vaccinations());
        let combined = NormalizedTables::new(facts, Vec::new(), vaccinations).expect("tables");

        let rows = rolling_vaccinations(&combined);
        let totals: Vec<_> = rows
            .iter()
            .map(|row| (row.country.as_str(), row.rolling_vaccinations))
            .collect();
        assert_eq!(totals, [("A", 5), ("A", 10), ("B", 7)]);
    }

    #[test]
    fn running_total_saturates_instead_of_overflowing() {
        let rows =
            rolling_vaccinations(&tables("Y", Some("Asia"), &[Some(i64::MAX - 1), Some(5)]));
        let totals: Vec<_> = rows.iter().map(|row| row.rolling_vaccinations).collect();
        assert_eq!(totals, [i64::MAX - 1, i64::MAX]);
    }

    #[test]
    fn blank_continent_rows_are_kept() {
        let rows = rolling_vaccinations(&tables("High income", Some(""), &[Some(10)]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].continent, "");
    }

    #[test]
    fn region_rows_are_skipped() {
        let rows = rolling_vaccinations(&tables("World", None, &[Some(100)]));
        assert!(rows.is_empty());
    }

    #[test]
    fn percentages_can_exceed_one_hundred() {
        let rolling =
            rolling_vaccinations(&tables("Z", Some("Europe"), &[Some(90), Some(60), Some(70)]));
        let pct = vaccinated_percentages(&rolling).expect("defined population");
        let values: Vec<_> = pct.iter().filter_map(|row| row.percentage_vaccinated).collect();
        assert_eq!(values, [90.0, 150.0, 220.0]);
    }
}
