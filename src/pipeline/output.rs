use crate::pipeline::dataset::DatasetOutput;
use crate::pipeline::error::DatasetError;
use crate::utils::write_atomically;
use log::info;
use polars::prelude::*;
use std::io;
use std::path::{Path, PathBuf};

/// Writes `df` as CSV with a header row. ISO dates, empty cells for absent values.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), DatasetError> {
    write_atomically(path, |file| {
        CsvWriter::new(file)
            .include_header(true)
            .finish(df)
            .map_err(io::Error::other)
    })
    .map_err(|e| DatasetError::OutputWrite(path.to_path_buf(), e))?;
    info!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Writes one dataset's `(h3_index, date, <column>)` table into `output_dir`.
pub fn write_dataset_csv(output: &DatasetOutput, output_dir: &Path) -> Result<PathBuf, DatasetError> {
    let path = output_dir.join(output.spec.output_file_name());
    let mut df = output.table.to_dataframe(&output.spec.column)?;
    write_csv(&mut df, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetSpec;
    use crate::pipeline::dataset::DatasetReport;
    use crate::raster::sampler::TierStats;
    use crate::types::value_table::ValueTable;
    use chrono::NaiveDate;
    use std::sync::Arc;

    #[test]
    fn dataset_csv_has_iso_dates_and_empty_absences() {
        let ids: Arc<[String]> = vec!["87658a0d4ffffff".to_string()].into();
        let mut table = ValueTable::new(ids);
        table
            .push_date(NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(), vec![Some(1.5)])
            .unwrap();
        table
            .push_date(NaiveDate::from_ymd_opt(2022, 1, 2).unwrap(), vec![None])
            .unwrap();
        let output = DatasetOutput {
            spec: DatasetSpec::new("rain", "daily_rain", "rain_mm"),
            table,
            report: DatasetReport {
                name: "rain".to_string(),
                stacks: 1,
                records: 2,
                tiers: TierStats::default(),
                absent_after_sampling: 1,
                absent_after_spatial: 1,
                absent_after_rescue: 1,
                spatial: Default::default(),
                rescue: Default::default(),
            },
        };

        let dir = tempfile::tempdir().unwrap();
        let path = write_dataset_csv(&output, dir.path()).unwrap();
        assert!(path.ends_with("h3_rain_daily.csv"));

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "h3_index,date,rain_mm");
        assert_eq!(lines[1], "87658a0d4ffffff,2022-01-01,1.5");
        assert_eq!(lines[2], "87658a0d4ffffff,2022-01-02,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn unwritable_destination_is_reported() {
        let mut df = polars::df!("a" => [1i32]).unwrap();
        let err = write_csv(&mut df, Path::new("/no/such/dir/out.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::OutputWrite(..)));
    }
}
