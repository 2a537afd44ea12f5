use thiserror::Error;

/// Validation and contract errors exposed by `epistat-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("country cannot be empty")]
    EmptyCountry,

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },

    #[error("unknown report view '{value}'; run `epistat views` for the list")]
    UnknownView { value: String },
}

/// Undefined rate inputs. Only the population-denominated rates can fail;
/// the mortality rate coalesces its denominator to zero instead.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RateError {
    #[error("population is null or zero; {metric} is undefined")]
    UndefinedPopulation { metric: &'static str },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Rate(#[from] RateError),

    #[error("duplicate key ({country}, {date}) in {table}")]
    DuplicateKey {
        table: &'static str,
        country: String,
        date: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
