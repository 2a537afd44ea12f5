//! Rate formulas shared by every report.
//!
//! The mortality rate guards its denominator and never yields a missing
//! value. The population-denominated rates are deliberately unguarded: a
//! zero or missing population is surfaced as [`RateError`] instead of being
//! coalesced, so a bad population never looks like a real 0%.
//!
//! Precision differs per metric (2, 3, and 2 decimal places) and rounding is
//! half away from zero, the same as SQL `ROUND`.

use crate::RateError;

/// Decimal places of [`mortality_rate`].
pub const MORTALITY_PRECISION: u32 = 2;
/// Decimal places of [`infection_rate`].
pub const INFECTION_PRECISION: u32 = 3;
/// Decimal places of [`vaccinated_percentage`].
pub const VACCINATED_PRECISION: u32 = 2;

/// Deaths as a percentage of cases.
///
/// Returns `0.0` when `total_cases` is zero or missing. Missing deaths count
/// as zero deaths.
pub fn mortality_rate(total_deaths: Option<i64>, total_cases: Option<i64>) -> f64 {
    match total_cases {
        None | Some(0) => 0.0,
        Some(cases) => {
            let deaths = total_deaths.unwrap_or(0) as f64;
            round_to(deaths / cases as f64 * 100.0, MORTALITY_PRECISION)
        }
    }
}

/// Cumulative cases as a percentage of population.
///
/// A missing case count propagates as `Ok(None)`.
pub fn infection_rate(
    total_cases: Option<i64>,
    population: Option<i64>,
) -> Result<Option<f64>, RateError> {
    let population = defined_population(population, "infection_rate")?;
    Ok(total_cases.map(|cases| round_to(cases as f64 / population * 100.0, INFECTION_PRECISION)))
}

/// Rolling vaccinations as a percentage of population. Not capped at 100.
pub fn vaccinated_percentage(rolling_count: i64, population: Option<i64>) -> Result<f64, RateError> {
    let population = defined_population(population, "vaccinated_percentage")?;
    Ok(round_to(
        rolling_count as f64 / population * 100.0,
        VACCINATED_PRECISION,
    ))
}

/// Round to `places` decimals, half away from zero.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10_f64.powi(places as i32);
    (value * factor).round() / factor
}

fn defined_population(population: Option<i64>, metric: &'static str) -> Result<f64, RateError> {
    match population {
        Some(value) if value != 0 => Ok(value as f64),
        _ => Err(RateError::UndefinedPopulation { metric }),
    }
}
