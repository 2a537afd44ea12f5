use serde::{Deserialize, Serialize};

use crate::{ReportDate, ValidationError};

/// Compound `(country, date)` key shared by all normalized tables.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub country: String,
    pub date: ReportDate,
}

impl RecordKey {
    pub fn new(country: impl Into<String>, date: ReportDate) -> Result<Self, ValidationError> {
        Ok(Self {
            country: validate_country(country.into())?,
            date,
        })
    }
}

/// Normalized per-country, per-day case and population row.
///
/// A `None` continent marks a pseudo-row the source feed injects for world
/// regions and income groups rather than an actual country. Values are
/// carried exactly as the feed reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub country: String,
    pub date: ReportDate,
    pub code: Option<String>,
    pub continent: Option<String>,
    pub population: Option<i64>,
    pub new_cases: Option<i64>,
    pub total_cases: Option<i64>,
}

impl Fact {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        country: impl Into<String>,
        date: ReportDate,
        code: Option<String>,
        continent: Option<String>,
        population: Option<i64>,
        new_cases: Option<i64>,
        total_cases: Option<i64>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            country: validate_country(country.into())?,
            date,
            code,
            continent,
            population,
            new_cases,
            total_cases,
        })
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            country: self.country.clone(),
            date: self.date,
        }
    }

    /// Whether this row is a region/world aggregate rather than a country.
    pub fn is_region(&self) -> bool {
        self.continent.is_none()
    }
}

/// Death counts for one `(country, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathRecord {
    pub country: String,
    pub date: ReportDate,
    pub new_deaths: Option<i64>,
    pub total_deaths: Option<i64>,
}

impl DeathRecord {
    pub fn new(
        country: impl Into<String>,
        date: ReportDate,
        new_deaths: Option<i64>,
        total_deaths: Option<i64>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            country: validate_country(country.into())?,
            date,
            new_deaths,
            total_deaths,
        })
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            country: self.country.clone(),
            date: self.date,
        }
    }
}

/// Vaccination counts for one `(country, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationRecord {
    pub country: String,
    pub date: ReportDate,
    pub new_vaccinations: Option<i64>,
    pub total_vaccinations: Option<i64>,
}

impl VaccinationRecord {
    pub fn new(
        country: impl Into<String>,
        date: ReportDate,
        new_vaccinations: Option<i64>,
        total_vaccinations: Option<i64>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            country: validate_country(country.into())?,
            date,
            new_vaccinations,
            total_vaccinations,
        })
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            country: self.country.clone(),
            date: self.date,
        }
    }
}

fn validate_country(country: String) -> Result<String, ValidationError> {
    if country.trim().is_empty() {
        return Err(ValidationError::EmptyCountry);
    }
    Ok(country)
}
