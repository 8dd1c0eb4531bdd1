use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("no valid sales in the last {0} days")]
    NoRecentSales(u32),

    #[error("could not fetch market data: {0}")]
    Lookup(String),

    #[error("store io: {0}")]
    Io(#[from] std::io::Error),

    #[error("store format: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
