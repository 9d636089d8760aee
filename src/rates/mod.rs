pub mod xotelo;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("GET {url} returned {status}: {preview}")]
    Status {
        url: String,
        status: u16,
        preview: String,
    },
    #[error("invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("error {status_code}: {message}")]
    Api { status_code: i64, message: String },
    #[error("response has no result")]
    MissingResult,
    #[error("no rates listed")]
    NoRates,
    #[error("rate out of range: {0}")]
    InvalidRate(String),
}

impl FetchError {
    /// An empty rate list means the hotel has nothing to sell that night,
    /// which is a missing rate rather than a failed lookup.
    pub fn is_absence(&self) -> bool {
        matches!(self, Self::NoRates)
    }
}

#[async_trait]
pub trait RateFetcher: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(
        &self,
        hotel_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<i64, FetchError>;
}
