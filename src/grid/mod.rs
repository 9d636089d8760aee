pub mod collector;
pub mod highlight;
pub mod window;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use highlight::classify;
pub use window::RateWindow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    #[default]
    Unset,
    Baseline,
    BelowBaseline,
    TopK,
    Normal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RateCell {
    pub value: Option<i64>,
    pub classification: Classification,
}

impl RateCell {
    pub fn new(value: Option<i64>) -> Self {
        Self {
            value,
            classification: Classification::Unset,
        }
    }
}

/// One date's rates. `cells[0]` is the baseline hotel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateRow {
    pub date: NaiveDate,
    pub cells: Vec<RateCell>,
}

impl RateRow {
    pub fn new(date: NaiveDate, baseline: Option<i64>, competitors: &[Option<i64>]) -> Self {
        let mut cells = Vec::with_capacity(1 + competitors.len());
        cells.push(RateCell::new(baseline));
        cells.extend(competitors.iter().copied().map(RateCell::new));
        Self { date, cells }
    }

    pub fn from_values(date: NaiveDate, values: Vec<Option<i64>>) -> Self {
        Self {
            date,
            cells: values.into_iter().map(RateCell::new).collect(),
        }
    }

    pub fn baseline(&self) -> Option<&RateCell> {
        self.cells.first()
    }

    pub fn competitors(&self) -> &[RateCell] {
        self.cells.get(1..).unwrap_or(&[])
    }

    pub fn count(&self, classification: Classification) -> usize {
        self.cells
            .iter()
            .filter(|c| c.classification == classification)
            .count()
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.value.is_none()).count()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("row for {date} has {actual} cells, expected {expected}")]
    RowWidth {
        date: NaiveDate,
        expected: usize,
        actual: usize,
    },
    #[error("row date {date} does not follow {previous}")]
    DateOrder {
        previous: NaiveDate,
        date: NaiveDate,
    },
    #[error("row date {0} is outside the grid window")]
    OutsideWindow(NaiveDate),
    #[error("grid window is full ({0} rows)")]
    Full(usize),
    #[error("grid needs at least one column")]
    NoColumns,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateGrid {
    columns: Vec<String>,
    window: RateWindow,
    rows: Vec<RateRow>,
}

impl RateGrid {
    pub fn new(columns: Vec<String>, window: RateWindow) -> Result<Self, GridError> {
        if columns.is_empty() {
            return Err(GridError::NoColumns);
        }
        Ok(Self {
            columns,
            rows: Vec::with_capacity(window.len()),
            window,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn window(&self) -> &RateWindow {
        &self.window
    }

    pub fn rows(&self) -> &[RateRow] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_complete(&self) -> bool {
        self.rows.len() == self.window.len()
    }

    pub fn push_row(&mut self, row: RateRow) -> Result<(), GridError> {
        if row.cells.len() != self.width() {
            return Err(GridError::RowWidth {
                date: row.date,
                expected: self.width(),
                actual: row.cells.len(),
            });
        }
        if !self.window.contains(row.date) {
            return Err(GridError::OutsideWindow(row.date));
        }
        if self.rows.len() >= self.window.len() {
            return Err(GridError::Full(self.window.len()));
        }
        if let Some(last) = self.rows.last() {
            if row.date <= last.date {
                return Err(GridError::DateOrder {
                    previous: last.date,
                    date: row.date,
                });
            }
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn classify_all(&mut self, k: usize) {
        for row in &mut self.rows {
            *row = classify(row, k);
        }
    }

    pub fn missing_count(&self) -> usize {
        self.rows.iter().map(RateRow::missing_count).sum()
    }
}
