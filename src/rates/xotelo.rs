use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Number;
use tracing::debug;

use crate::config::ApiConfig;
use crate::rates::{FetchError, RateFetcher};

const USER_AGENT: &str = "hotel-rate-sheet/0.1";
const PREVIEW_CHARS: usize = 180;

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    error: Option<ApiError>,
    #[serde(default)]
    result: Option<RatesResult>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    status_code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RatesResult {
    #[serde(default)]
    rates: Vec<RateEntry>,
}

#[derive(Debug, Deserialize)]
struct RateEntry {
    #[serde(default)]
    rate: Option<Number>,
}

pub struct XoteloFetcher {
    client: Client,
    base_url: String,
    currency: String,
}

impl XoteloFetcher {
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            currency: config.currency.clone(),
        })
    }
}

#[async_trait]
impl RateFetcher for XoteloFetcher {
    fn name(&self) -> &str {
        "Xotelo"
    }

    async fn fetch(
        &self,
        hotel_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<i64, FetchError> {
        let query = rate_query(&self.currency, hotel_id, check_in, check_out);
        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await?;
        let url = response.url().to_string();
        let status = response.status();
        let body = response.text().await?;
        debug!("GET {url} -> {status}");
        check_status(&url, status, &body)?;
        decode_rate_response(&body)
    }
}

pub fn rate_query(
    currency: &str,
    hotel_id: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> [(&'static str, String); 4] {
    [
        ("currency", currency.to_string()),
        ("hotel_key", hotel_id.to_string()),
        ("chk_in", check_in.format("%Y-%m-%d").to_string()),
        ("chk_out", check_out.format("%Y-%m-%d").to_string()),
    ]
}

pub fn check_status(url: &str, status: StatusCode, body: &str) -> Result<(), FetchError> {
    if status.is_success() {
        return Ok(());
    }
    let preview: String = body.chars().take(PREVIEW_CHARS).collect();
    Err(FetchError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        preview,
    })
}

/// A listed offer without a price counts as no rate.
pub fn decode_rate_response(body: &str) -> Result<i64, FetchError> {
    let parsed: RatesResponse = serde_json::from_str(body)?;
    if let Some(error) = parsed.error {
        return Err(FetchError::Api {
            status_code: error.status_code,
            message: error.message,
        });
    }
    let result = parsed.result.ok_or(FetchError::MissingResult)?;
    let first = result.rates.first().ok_or(FetchError::NoRates)?;
    let rate = first.rate.as_ref().ok_or(FetchError::NoRates)?;
    number_to_rate(rate).ok_or_else(|| FetchError::InvalidRate(rate.to_string()))
}

fn number_to_rate(number: &Number) -> Option<i64> {
    if let Some(rate) = number.as_i64() {
        return Some(rate);
    }
    let rounded = number.as_f64()?.round();
    // 2^63 is exactly representable; anything at or past it does not fit.
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use reqwest::StatusCode;
    use serde_json::json;

    use super::{check_status, decode_rate_response, rate_query};
    use crate::rates::FetchError;

    fn decode(value: serde_json::Value) -> Result<i64, FetchError> {
        decode_rate_response(&value.to_string())
    }

    #[test]
    fn takes_the_first_rate() {
        let body = json!({
            "error": null,
            "result": {
                "chk_in": "2026-10-16",
                "chk_out": "2026-10-17",
                "currency": "USD",
                "rates": [
                    { "code": "BookingCom", "name": "Booking.com", "rate": 112, "tax": 14 },
                    { "code": "Expedia", "name": "Expedia", "rate": 109, "tax": 13 }
                ]
            },
            "timestamp": 1760000000
        });
        assert_eq!(decode(body).expect("rate"), 112);
    }

    #[test]
    fn rounds_fractional_rates() {
        let body = json!({ "result": { "rates": [{ "rate": 99.6 }] } });
        assert_eq!(decode(body).expect("rate"), 100);
    }

    #[test]
    fn maps_error_field() {
        let body = json!({
            "error": { "status_code": 400, "message": "Invalid hotel_key" },
            "result": null
        });
        match decode(body) {
            Err(FetchError::Api {
                status_code,
                message,
            }) => {
                assert_eq!(status_code, 400);
                assert_eq!(message, "Invalid hotel_key");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn missing_result_and_empty_rates() {
        assert!(matches!(
            decode(json!({ "error": null, "result": null })),
            Err(FetchError::MissingResult)
        ));
        assert!(matches!(decode(json!({})), Err(FetchError::MissingResult)));
        let empty = decode(json!({ "result": { "rates": [] } }));
        assert!(matches!(empty, Err(ref e) if e.is_absence()));
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        assert!(matches!(
            decode_rate_response("<html>gateway timeout</html>"),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn null_rate_counts_as_absence() {
        let body = json!({ "result": { "rates": [{ "code": "Expedia", "rate": null }] } });
        assert!(matches!(decode(body), Err(FetchError::NoRates)));
        let body = json!({ "result": { "rates": [{ "code": "Expedia" }] } });
        assert!(matches!(decode(body), Err(FetchError::NoRates)));
    }

    #[test]
    fn rejects_rates_that_do_not_fit() {
        let body = json!({ "result": { "rates": [{ "rate": 1e30 }] } });
        match decode(body) {
            Err(FetchError::InvalidRate(raw)) => assert!(raw.contains("e30")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let body = json!({ "result": { "rates": [{ "rate": u64::MAX }] } });
        assert!(matches!(decode(body), Err(FetchError::InvalidRate(_))));
    }

    #[test]
    fn builds_rate_query() {
        let check_in = NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date");
        let check_out = NaiveDate::from_ymd_opt(2026, 10, 17).expect("valid date");
        let query = rate_query("USD", "g50892-d95503", check_in, check_out);
        assert_eq!(
            query,
            [
                ("currency", "USD".to_string()),
                ("hotel_key", "g50892-d95503".to_string()),
                ("chk_in", "2026-10-16".to_string()),
                ("chk_out", "2026-10-17".to_string()),
            ]
        );
    }

    #[test]
    fn non_success_status_keeps_a_body_preview() {
        let url = "https://data.xotelo.com/api/rates?hotel_key=x";
        assert!(check_status(url, StatusCode::OK, "{}").is_ok());

        let body = "x".repeat(500);
        match check_status(url, StatusCode::BAD_GATEWAY, &body) {
            Err(FetchError::Status {
                url: got,
                status,
                preview,
            }) => {
                assert_eq!(got, url);
                assert_eq!(status, 502);
                assert_eq!(preview.len(), 180);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
