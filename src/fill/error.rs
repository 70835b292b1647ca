use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FillError {
    #[error("No cell holds a single valid value across {dates} dates, nothing to rescue from")]
    NoValidCells { dates: usize },

    #[error("Got {centers} cell centers for a table of {cells} cells")]
    CenterCount { centers: usize, cells: usize },
}
