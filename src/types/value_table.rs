//! Dense per-dataset value storage: one optional value per (cell, date).
//!
//! Rows are dates in strictly increasing order and columns are grid cells in grid
//! order, so every (cell, date) key appears at most once by construction.

use chrono::{DateTime, NaiveDate};
use polars::prelude::*;
use std::sync::Arc;
use thiserror::Error;

pub const COL_CELL: &str = "h3_index";
pub const COL_DATE: &str = "date";

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("Row for {date} has {found} values, expected one per cell ({expected})")]
    RowLength {
        date: NaiveDate,
        expected: usize,
        found: usize,
    },

    #[error("Date {date} does not follow the last stored date {last}")]
    DateOrder { date: NaiveDate, last: NaiveDate },
}

/// The atomic unit of tabular output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record<'a> {
    pub cell_id: &'a str,
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueTable {
    cell_ids: Arc<[String]>,
    dates: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

impl ValueTable {
    pub fn new(cell_ids: Arc<[String]>) -> Self {
        Self {
            cell_ids,
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Appends one date row. Dates must be strictly increasing.
    pub fn push_date(&mut self, date: NaiveDate, row: Vec<Option<f64>>) -> Result<(), TableError> {
        if row.len() != self.cell_ids.len() {
            return Err(TableError::RowLength {
                date,
                expected: self.cell_ids.len(),
                found: row.len(),
            });
        }
        if let Some(&last) = self.dates.last() {
            if date <= last {
                return Err(TableError::DateOrder { date, last });
            }
        }
        self.dates.push(date);
        self.values.extend(row);
        Ok(())
    }

    pub fn cell_ids(&self) -> &Arc<[String]> {
        &self.cell_ids
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn cell_count(&self) -> usize {
        self.cell_ids.len()
    }

    pub fn date_count(&self) -> usize {
        self.dates.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn get(&self, date_idx: usize, cell_idx: usize) -> Option<f64> {
        self.values[date_idx * self.cell_count() + cell_idx]
    }

    pub fn set(&mut self, date_idx: usize, cell_idx: usize, value: Option<f64>) {
        let n = self.cell_count();
        self.values[date_idx * n + cell_idx] = value;
    }

    pub fn row(&self, date_idx: usize) -> &[Option<f64>] {
        let n = self.cell_count();
        &self.values[date_idx * n..(date_idx + 1) * n]
    }

    pub fn row_mut(&mut self, date_idx: usize) -> &mut [Option<f64>] {
        let n = self.cell_count();
        &mut self.values[date_idx * n..(date_idx + 1) * n]
    }

    /// Full time series of one cell, in date order.
    pub fn cell_series(&self, cell_idx: usize) -> Vec<Option<f64>> {
        (0..self.date_count())
            .map(|d| self.get(d, cell_idx))
            .collect()
    }

    pub fn set_cell_series(&mut self, cell_idx: usize, series: &[Option<f64>]) {
        for (d, value) in series.iter().enumerate().take(self.date_count()) {
            self.set(d, cell_idx, *value);
        }
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Number of valid dates for every cell.
    pub fn valid_counts_per_cell(&self) -> Vec<usize> {
        let mut counts = vec![0; self.cell_count()];
        for row in self.values.chunks(self.cell_count().max(1)) {
            for (count, value) in counts.iter_mut().zip(row) {
                if value.is_some() {
                    *count += 1;
                }
            }
        }
        counts
    }

    /// Records in date-major order (every cell for the first date, then the next date, ...).
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.dates.iter().enumerate().flat_map(move |(d, &date)| {
            self.cell_ids
                .iter()
                .enumerate()
                .map(move |(c, cell_id)| Record {
                    cell_id,
                    date,
                    value: self.get(d, c),
                })
        })
    }

    /// Converts the table to a `(h3_index, date, <value_column>)` DataFrame.
    pub fn to_dataframe(&self, value_column: &str) -> PolarsResult<DataFrame> {
        let epoch = DateTime::UNIX_EPOCH.date_naive();
        let mut ids = Vec::with_capacity(self.len());
        let mut days = Vec::with_capacity(self.len());
        let mut values = Vec::with_capacity(self.len());
        for record in self.records() {
            ids.push(record.cell_id);
            days.push(record.date.signed_duration_since(epoch).num_days() as i32);
            values.push(record.value);
        }

        let dates = Series::new(COL_DATE.into(), days).cast(&DataType::Date)?;
        DataFrame::new(vec![
            Column::new(COL_CELL.into(), ids),
            dates.into(),
            Column::new(value_column.into(), values),
        ])
    }
}
