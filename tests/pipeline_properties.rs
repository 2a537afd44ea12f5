//! Properties of the in-memory pipeline, checked over seeded random feeds.

use std::collections::{BTreeMap, BTreeSet};

use epistat_core::rates::round_to;
use epistat_core::{
    mortality_rate, normalize, vaccinated_percentage, CoreError, LatestBy, RateError,
    RawCovidRow, RawVaccinationRow, ReportDate, ReportSet,
};
use time::{Date, Duration, Month};

const SEEDS: std::ops::Range<u64> = 0..48;
const COUNTRIES: [(&str, Option<&str>); 7] = [
    ("Chile", Some("South America")),
    ("Peru", Some("South America")),
    ("Kenya", Some("Africa")),
    ("Norway", Some("Europe")),
    ("Japan", Some("Asia")),
    ("World", None),
    ("High income", Some("")),
];

struct Feeds {
    covid: Vec<RawCovidRow>,
    vaccinations: Vec<RawVaccinationRow>,
}

fn maybe(rng: &mut fastrand::Rng, value: i64) -> Option<i64> {
    (rng.u8(0..6) != 0).then_some(value)
}

fn generate(seed: u64) -> Feeds {
    let mut rng = fastrand::Rng::with_seed(seed);
    let start = Date::from_calendar_date(2021, Month::January, 1).expect("valid date");
    let mut covid = Vec::new();
    let mut vaccinations = Vec::new();

    for (country, continent) in COUNTRIES {
        let population = rng.i64(1_000..10_000_000);
        let offset = rng.i64(0..3);
        let (mut cases, mut deaths) = (0_i64, 0_i64);

        for day in 0..rng.i64(1..=8) {
            let date = ReportDate::from_date(start + Duration::days(offset + day));
            let new_cases = rng.i64(0..500);
            let new_deaths = rng.i64(0..=new_cases / 10);
            cases += new_cases;
            deaths += new_deaths;

            covid.push(RawCovidRow {
                location: country.to_owned(),
                date,
                iso_code: None,
                continent: continent.map(str::to_owned),
                population: Some(population),
                new_cases: maybe(&mut rng, new_cases),
                total_cases: maybe(&mut rng, cases),
                new_deaths: maybe(&mut rng, new_deaths),
                total_deaths: maybe(&mut rng, deaths),
            });

            if rng.u8(0..5) != 0 {
                let doses = rng.i64(0..(population / 2).max(1));
                vaccinations.push(RawVaccinationRow {
                    location: country.to_owned(),
                    date,
                    new_vaccinations: (rng.u8(0..4) != 0).then_some(doses),
                    total_vaccinations: None,
                });
            }
        }
    }

    Feeds {
        covid,
        vaccinations,
    }
}

fn compute(feeds: &Feeds) -> ReportSet {
    let tables =
        normalize(&feeds.covid, &feeds.covid, &feeds.vaccinations).expect("normalize feeds");
    ReportSet::compute(&tables).expect("compute report")
}

fn is_region(row: &RawCovidRow) -> bool {
    row.continent.is_none()
}

#[test]
fn mortality_rate_is_zero_without_cases_and_rounded_otherwise() {
    let mut rng = fastrand::Rng::with_seed(7);
    for _ in 0..1_000 {
        let deaths = rng.i64(0..100_000);
        assert_eq!(mortality_rate(Some(deaths), Some(0)), 0.0);
        assert_eq!(mortality_rate(Some(deaths), None), 0.0);

        let cases = rng.i64(1..1_000_000);
        let expected = round_to(deaths as f64 / cases as f64 * 100.0, 2);
        assert_eq!(mortality_rate(Some(deaths), Some(cases)), expected);
        assert!(mortality_rate(Some(deaths + 1), Some(cases)) >= expected);
    }
}

#[test]
fn the_worked_examples_hold() {
    assert_eq!(mortality_rate(Some(10), Some(200)), 5.0);
    assert_eq!(mortality_rate(Some(10), Some(0)), 0.0);
    assert_eq!(vaccinated_percentage(150, Some(100)), Ok(150.0));
}

#[test]
fn rolling_counts_are_prefix_sums_of_reported_days() {
    for seed in SEEDS {
        let feeds = generate(seed);
        let report = compute(&feeds);

        let mut expected = Vec::new();
        let mut vaccinations: Vec<_> = feeds
            .vaccinations
            .iter()
            .filter(|row| {
                COUNTRIES
                    .iter()
                    .any(|(name, continent)| *name == row.location && continent.is_some())
            })
            .collect();
        vaccinations.sort_by(|a, b| (&a.location, a.date).cmp(&(&b.location, b.date)));

        let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
        for row in vaccinations {
            let Some(doses) = row.new_vaccinations else {
                continue;
            };
            let total = totals.entry(row.location.as_str()).or_insert(0);
            *total += doses;
            expected.push((row.location.clone(), row.date, *total));
        }

        let actual: Vec<_> = report
            .country_vacs_rolling_count
            .iter()
            .map(|row| (row.country.clone(), row.date, row.rolling_vaccinations))
            .collect();
        assert_eq!(actual, expected, "seed {seed}");

        for pair in report.country_vacs_rolling_count.windows(2) {
            if pair[0].country == pair[1].country {
                assert!(
                    pair[1].rolling_vaccinations >= pair[0].rolling_vaccinations,
                    "seed {seed}"
                );
            }
        }
    }
}

#[test]
fn vaccinated_percentages_follow_the_rolling_counts() {
    for seed in SEEDS {
        let report = compute(&generate(seed));
        assert_eq!(
            report.daily_percentage_vaccinated.len(),
            report.country_vacs_rolling_count.len()
        );
        for (pct, rolling) in report
            .daily_percentage_vaccinated
            .iter()
            .zip(&report.country_vacs_rolling_count)
        {
            assert_eq!(pct.rolling_vaccinations, rolling.rolling_vaccinations);
            let population = rolling.population.expect("generated population") as f64;
            assert_eq!(
                pct.percentage_vaccinated,
                Some(round_to(
                    rolling.rolling_vaccinations as f64 / population * 100.0,
                    2
                ))
            );
        }
    }
}

#[test]
fn global_final_is_the_sum_of_country_maxima() {
    for seed in SEEDS {
        let feeds = generate(seed);
        let report = compute(&feeds);

        let mut max_cases: BTreeMap<&str, Option<i64>> = BTreeMap::new();
        let mut max_deaths: BTreeMap<&str, Option<i64>> = BTreeMap::new();
        for row in feeds.covid.iter().filter(|row| !is_region(row)) {
            let cases = max_cases.entry(row.location.as_str()).or_insert(None);
            *cases = (*cases).max(row.total_cases);
            let deaths = max_deaths.entry(row.location.as_str()).or_insert(None);
            *deaths = (*deaths).max(row.total_deaths);
        }
        let sum = |values: BTreeMap<&str, Option<i64>>| {
            values
                .into_values()
                .flatten()
                .fold(None, |total: Option<i64>, value| {
                    Some(total.unwrap_or(0) + value)
                })
        };

        let total = &report.global_final_cases_deaths_mortality;
        let (cases, deaths) = (sum(max_cases), sum(max_deaths));
        assert_eq!(total.total_cases, cases, "seed {seed}");
        assert_eq!(total.total_deaths, deaths, "seed {seed}");
        assert_eq!(total.mortality_rate, mortality_rate(deaths, cases));
    }
}

#[test]
fn region_rows_only_reach_the_region_view() {
    let regions: BTreeSet<&str> = ["World"].into_iter().collect();

    for seed in SEEDS {
        let report = compute(&generate(seed));

        let per_country = report
            .max_mortality_rate
            .iter()
            .map(|row| row.country.as_str())
            .chain(report.infected_rate.iter().map(|row| row.country.as_str()))
            .chain(report.peak_infected_rate.iter().map(|row| row.country.as_str()))
            .chain(report.total_deaths_over_time.iter().map(|row| row.country.as_str()))
            .chain(
                report
                    .country_final_cases_deaths_mortality
                    .iter()
                    .map(|row| row.country.as_str()),
            )
            .chain(
                report
                    .country_vacs_rolling_count
                    .iter()
                    .map(|row| row.country.as_str()),
            );
        for country in per_country {
            assert!(!regions.contains(country), "seed {seed}: {country}");
        }

        for row in &report.region_total_deaths_over_time {
            assert!(regions.contains(row.region.as_str()), "seed {seed}");
        }
        // A blank continent is still a continent.
        assert!(report
            .total_deaths_over_time
            .iter()
            .any(|row| row.country == "High income"));
    }
}

#[test]
fn feed_order_does_not_change_the_report() {
    for seed in SEEDS {
        let feeds = generate(seed);
        let expected = compute(&feeds);

        let mut rng = fastrand::Rng::with_seed(seed ^ 0xfeed);
        let mut shuffled = Feeds {
            covid: feeds.covid.clone(),
            vaccinations: feeds.vaccinations.clone(),
        };
        rng.shuffle(&mut shuffled.covid);
        rng.shuffle(&mut shuffled.vaccinations);

        assert_eq!(compute(&shuffled), expected, "seed {seed}");
    }
}

#[test]
fn latest_by_date_never_exceeds_the_maximum() {
    for seed in SEEDS {
        let feeds = generate(seed);
        let tables = normalize(&feeds.covid, &feeds.covid, &feeds.vaccinations).expect("tables");
        let by_max = ReportSet::compute_with(&tables, LatestBy::Max).expect("max");
        let by_date = ReportSet::compute_with(&tables, LatestBy::Date).expect("date");

        for (max, latest) in by_max
            .country_final_cases_deaths_mortality
            .iter()
            .zip(&by_date.country_final_cases_deaths_mortality)
        {
            assert_eq!(max.country, latest.country);
            if let Some(latest_cases) = latest.total_cases {
                assert!(max.total_cases >= Some(latest_cases), "seed {seed}");
            }
        }
    }
}

#[test]
fn duplicate_keys_are_rejected() {
    let mut feeds = generate(3);
    let repeated = feeds.covid[0].clone();
    feeds.covid.push(repeated.clone());

    let error = normalize(&feeds.covid, &feeds.covid, &feeds.vaccinations)
        .expect_err("duplicate key");

    match error {
        CoreError::DuplicateKey { country, date, .. } => {
            assert_eq!(country, repeated.location);
            assert_eq!(date, repeated.date.format_iso());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zero_population_is_reported_rather_than_masked() {
    let mut feeds = generate(5);
    for row in feeds.covid.iter_mut().filter(|row| row.location == "Chile") {
        row.population = Some(0);
        row.total_cases = Some(10);
    }
    let tables = normalize(&feeds.covid, &feeds.covid, &feeds.vaccinations).expect("tables");

    let error = ReportSet::compute(&tables).expect_err("undefined population");

    assert!(matches!(
        error,
        CoreError::Rate(RateError::UndefinedPopulation { .. })
    ));
}
