//! # Epistat Core
//!
//! Domain records, rate formulas, and the pure reporting pipeline for
//! COVID-19 case, death, and vaccination statistics.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`domain`] | Normalized records, typed view rows, [`ReportView`] |
//! | [`normalize`] | Raw feed projection and `(country, date)` joins |
//! | [`rates`] | Mortality, infection, and vaccinated-percentage formulas |
//! | [`aggregate`] | Country, continent, region, and global summaries |
//! | [`rolling`] | Running vaccination totals |
//! | [`pipeline`] | [`ReportSet`]: all views from one set of tables |
//!
//! ## Quick Start
//!
//! ```rust
//! use epistat_core::{normalize, RawCovidRow, ReportDate, ReportSet};
//!
//! let feed = vec![RawCovidRow {
//!     location: "X".to_string(),
//!     date: ReportDate::parse("2021-01-01")?,
//!     iso_code: None,
//!     continent: Some("Europe".to_string()),
//!     population: Some(1_000),
//!     new_cases: Some(200),
//!     total_cases: Some(200),
//!     new_deaths: Some(10),
//!     total_deaths: Some(10),
//! }];
//! let tables = normalize(&feed, &feed, &[])?;
//! let report = ReportSet::compute(&tables)?;
//! assert_eq!(report.country_final_cases_deaths_mortality[0].mortality_rate, 5.0);
//! # Ok::<(), epistat_core::CoreError>(())
//! ```
//!
//! The same views are materialized as SQL views by `epistat-warehouse`; the
//! two implementations are kept in agreement by the workspace tests.

pub mod aggregate;
pub mod domain;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod rates;
pub mod rolling;

pub use aggregate::LatestBy;
pub use domain::{
    ContinentDeathsRow, CountryDeathsRow, CountryFinalRow, DeathRecord, Fact, GlobalDailyRow,
    GlobalFinalRow, InfectionRateRow, MortalityRateRow, PeakInfectionRow, RecordKey,
    RegionDeathsRow, ReportDate, ReportView, RollingVaccinationRow, VaccinatedPercentageRow,
    VaccinationRecord,
};
pub use error::{CoreError, RateError, ValidationError};
pub use normalize::{normalize, NormalizedTables, RawCovidRow, RawVaccinationRow};
pub use pipeline::ReportSet;
pub use rates::{infection_rate, mortality_rate, vaccinated_percentage};
