use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::grid::{classify, RateGrid, RateRow, RateWindow};
use crate::hotels::{Hotel, HotelSet};
use crate::rates::{FetchError, RateFetcher};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchPolicy {
    #[default]
    Degrade,
    FailFast,
}

#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub top_k: usize,
    pub policy: FetchPolicy,
    /// In-flight lookups per date. Dates are always fetched one at a time.
    pub concurrency: usize,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            policy: FetchPolicy::Degrade,
            concurrency: 1,
        }
    }
}

pub async fn collect_grid(
    fetcher: &dyn RateFetcher,
    hotels: &HotelSet,
    window: RateWindow,
    options: &CollectOptions,
) -> Result<RateGrid> {
    let mut grid = RateGrid::new(hotels.display_names(), window)?;
    for date in window.dates() {
        info!("pulling rates for date: {}", date.format("%m/%d"));
        let values = fetch_row(fetcher, hotels, date, options).await?;
        let row = classify(&RateRow::from_values(date, values), options.top_k);
        grid.push_row(row)?;
    }
    info!(
        source = fetcher.name(),
        rows = grid.rows().len(),
        missing = grid.missing_count(),
        "rate grid complete"
    );
    Ok(grid)
}

async fn fetch_row(
    fetcher: &dyn RateFetcher,
    hotels: &HotelSet,
    date: NaiveDate,
    options: &CollectOptions,
) -> Result<Vec<Option<i64>>> {
    let check_out = date
        .succ_opt()
        .ok_or_else(|| anyhow!("no check-out date after {date}"))?;
    stream::iter(hotels.iter())
        .map(|hotel| async move {
            let outcome = fetcher.fetch(&hotel.provider_id, date, check_out).await;
            (hotel, outcome)
        })
        .buffered(options.concurrency.max(1))
        .map(|(hotel, outcome)| resolve(hotel, date, outcome, options.policy))
        .try_collect()
        .await
}

fn resolve(
    hotel: &Hotel,
    date: NaiveDate,
    outcome: Result<i64, FetchError>,
    policy: FetchPolicy,
) -> Result<Option<i64>> {
    match outcome {
        Ok(rate) => Ok(Some(rate)),
        Err(err) if err.is_absence() => {
            info!("no rates found for hotel: {hotel} on date: {date}");
            Ok(None)
        }
        Err(err) => match policy {
            FetchPolicy::Degrade => {
                warn!("rate lookup failed for hotel: {hotel} on date: {date} - {err}");
                Ok(None)
            }
            FetchPolicy::FailFast => Err(err)
                .with_context(|| format!("rate lookup failed for hotel: {hotel} on date: {date}")),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::{collect_grid, CollectOptions, FetchPolicy};
    use crate::grid::{Classification, RateWindow};
    use crate::hotels::{Hotel, HotelSet};
    use crate::rates::{FetchError, RateFetcher};

    type Script = fn(&str, NaiveDate) -> Result<i64, FetchError>;

    struct ScriptedFetcher {
        script: Script,
        calls: AtomicUsize,
        delay_by_column: bool,
    }

    impl ScriptedFetcher {
        fn new(script: Script) -> Self {
            Self {
                script,
                calls: AtomicUsize::new(0),
                delay_by_column: false,
            }
        }
    }

    #[async_trait]
    impl RateFetcher for ScriptedFetcher {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch(
            &self,
            hotel_id: &str,
            check_in: NaiveDate,
            check_out: NaiveDate,
        ) -> Result<i64, FetchError> {
            assert_eq!(check_in.succ_opt(), Some(check_out));
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay_by_column {
                // Earlier columns finish last.
                let wait = match hotel_id {
                    "base" => 30,
                    "a" => 20,
                    "b" => 10,
                    _ => 0,
                };
                tokio::time::sleep(Duration::from_millis(wait)).await;
            }
            (self.script)(hotel_id, check_in)
        }
    }

    fn hotels() -> HotelSet {
        HotelSet {
            baseline: Hotel::new("Base", "base"),
            competitors: vec![
                Hotel::new("A", "a"),
                Hotel::new("B", "b"),
                Hotel::new("C", "c"),
            ],
        }
    }

    fn window(days: u32) -> RateWindow {
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid date");
        RateWindow::from_offsets(today, 1, days, true).expect("window")
    }

    fn flat_rates(hotel_id: &str, _date: NaiveDate) -> Result<i64, FetchError> {
        match hotel_id {
            "base" => Ok(100),
            "a" => Ok(90),
            "b" => Ok(120),
            "c" => Ok(110),
            _ => Err(FetchError::MissingResult),
        }
    }

    fn flaky_rates(hotel_id: &str, date: NaiveDate) -> Result<i64, FetchError> {
        match hotel_id {
            "a" if date.format("%d").to_string() == "17" => Err(FetchError::Api {
                status_code: 500,
                message: "upstream unavailable".to_string(),
            }),
            "c" => Err(FetchError::NoRates),
            _ => flat_rates(hotel_id, date),
        }
    }

    #[test]
    fn fills_and_classifies_every_date() {
        let fetcher = ScriptedFetcher::new(flat_rates);
        let grid = tokio_test::block_on(collect_grid(
            &fetcher,
            &hotels(),
            window(3),
            &CollectOptions {
                top_k: 1,
                ..CollectOptions::default()
            },
        ))
        .expect("grid");

        assert_eq!(grid.rows().len(), 3);
        assert!(grid.is_complete());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 12);
        let labels: Vec<_> = grid.rows()[0]
            .cells
            .iter()
            .map(|c| c.classification)
            .collect();
        assert_eq!(
            labels,
            vec![
                Classification::Baseline,
                Classification::BelowBaseline,
                Classification::Normal,
                Classification::TopK,
            ]
        );
    }

    #[test]
    fn degrade_leaves_failed_cells_empty() {
        let fetcher = ScriptedFetcher::new(flaky_rates);
        let grid = tokio_test::block_on(collect_grid(
            &fetcher,
            &hotels(),
            window(3),
            &CollectOptions::default(),
        ))
        .expect("degraded grid");

        assert_eq!(grid.rows().len(), 3);
        // "c" never has rates, "a" fails once.
        assert_eq!(grid.missing_count(), 4);
        let failed = &grid.rows()[1].cells[1];
        assert_eq!(failed.value, None);
        assert_eq!(failed.classification, Classification::Unset);
    }

    #[test]
    fn fail_fast_aborts_on_hard_errors_only() {
        let fetcher = ScriptedFetcher::new(flaky_rates);
        let err = tokio_test::block_on(collect_grid(
            &fetcher,
            &hotels(),
            window(3),
            &CollectOptions {
                policy: FetchPolicy::FailFast,
                ..CollectOptions::default()
            },
        ))
        .expect_err("run should abort");
        assert!(err.to_string().contains("rate lookup failed"));
        // First date completes (4 calls), second stops at column "a".
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn concurrent_lookups_keep_column_order() {
        let mut fetcher = ScriptedFetcher::new(flat_rates);
        fetcher.delay_by_column = true;
        let grid = collect_grid(
            &fetcher,
            &hotels(),
            window(2),
            &CollectOptions {
                concurrency: 4,
                ..CollectOptions::default()
            },
        )
        .await
        .expect("grid");

        for row in grid.rows() {
            let values: Vec<_> = row.cells.iter().map(|c| c.value).collect();
            assert_eq!(values, vec![Some(100), Some(90), Some(120), Some(110)]);
        }
    }
}
