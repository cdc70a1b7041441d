use thiserror::Error;

#[derive(Error, Debug)]
pub enum TradeInfoError {
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("HTTP status error: {0}")]
    HttpStatus(u16),

    #[error("Invalid stock code: {0}")]
    InvalidCode(String),

    #[error("Numeric conversion error: {0}")]
    NumericConversion(String),
}

pub type Result<T> = std::result::Result<T, TradeInfoError>;
