use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RentalError {
    #[error("missing expected column `{column}`")]
    Schema { column: String },

    #[error("malformed data: {0}")]
    DataFormat(String),

    #[error("failed to read rental data: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, RentalError>;
