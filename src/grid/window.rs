use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::grid::GridError;

/// Contiguous range of stay dates, `start` inclusive and `end` exclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl RateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, GridError> {
        if end < start {
            return Err(GridError::DateOrder {
                previous: start,
                date: end,
            });
        }
        Ok(Self { start, end })
    }

    /// Window relative to `today`. With `end_inclusive` the day at
    /// `end_offset` is fetched too.
    pub fn from_offsets(
        today: NaiveDate,
        start_offset: u32,
        end_offset: u32,
        end_inclusive: bool,
    ) -> Result<Self, GridError> {
        let end_offset = if end_inclusive {
            end_offset.saturating_add(1)
        } else {
            end_offset
        };
        let start = offset(today, start_offset)?;
        let end = offset(today, end_offset)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start).num_days().max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d < end)
    }
}

fn offset(today: NaiveDate, days: u32) -> Result<NaiveDate, GridError> {
    today
        .checked_add_days(Days::new(u64::from(days)))
        .ok_or(GridError::OutsideWindow(today))
}
