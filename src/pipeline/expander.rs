//! Maps sampled `(band, cell)` values of monthly stacks onto calendar dates.

use crate::types::value_table::{TableError, ValueTable};
use chrono::{Days, Months, NaiveDate};
use log::warn;

/// Sampled values of the stack for one (year, month), laid out `[band][cell]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySamples {
    pub year: i32,
    pub month: u32,
    pub values: Vec<Vec<Option<f64>>>,
}

/// Date of band `band` (0-based) of the stack for `year`-`month`.
pub fn band_date(year: i32, month: u32, band: usize) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(band as u64))
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// Appends one row per band to `table`, dated `first-of-month + band` days.
///
/// Months must arrive in chronological order. A band count that differs from the
/// month length is logged and expanded as-is; bands spilling into a month that
/// arrives later are rejected by the table as out-of-order dates.
pub fn expand_records(table: &mut ValueTable, samples: MonthlySamples) -> Result<usize, TableError> {
    let MonthlySamples {
        year,
        month,
        values,
    } = samples;
    let band_count = values.len();
    if let Some(days) = days_in_month(year, month).filter(|&days| days as usize != band_count) {
        warn!("Stack for {year}-{month:02} has {band_count} bands, month has {days} days");
    }

    let mut appended = 0;
    for (band, row) in values.into_iter().enumerate() {
        let Some(date) = band_date(year, month, band) else {
            warn!("Band {band} of {year}-{month:02} has no valid calendar date, skipped");
            continue;
        };
        table.push_date(date, row)?;
        appended += 1;
    }
    Ok(appended)
}
