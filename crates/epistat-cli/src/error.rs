use epistat_warehouse::WarehouseError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] epistat_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Core(#[from] epistat_core::CoreError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) | Self::Core(_) => 2,
            Self::Warehouse(error) if error.is_load_error() => 3,
            Self::Warehouse(WarehouseError::Io(_)) | Self::Io(_) => 10,
            Self::Warehouse(_) => 2,
            Self::Serialization(_) => 4,
        }
    }
}
