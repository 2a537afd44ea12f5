//! # Domain Models
//!
//! Normalized input records and the typed rows of each reporting view.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Fact`] | Per-country, per-day cases and population |
//! | [`DeathRecord`] | Per-country, per-day deaths |
//! | [`VaccinationRecord`] | Per-country, per-day vaccinations |
//! | [`RecordKey`] | `(country, date)` compound key |
//! | [`ReportDate`] | Day granularity date |
//! | [`ReportView`] | The eleven named reporting views |
//!
//! Rows with no continent are region pseudo-rows injected by the source feed
//! (`World`, `Europe`, income groups). See [`Fact::is_region`].

mod date;
mod records;
mod reports;
mod view;

pub use date::ReportDate;
pub use records::{DeathRecord, Fact, RecordKey, VaccinationRecord};
pub use reports::{
    ContinentDeathsRow, CountryDeathsRow, CountryFinalRow, GlobalDailyRow, GlobalFinalRow,
    InfectionRateRow, MortalityRateRow, PeakInfectionRow, RegionDeathsRow, RollingVaccinationRow,
    VaccinatedPercentageRow,
};
pub use view::ReportView;
