use crate::raster::error::RasterError;
use log::{debug, warn};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static YEAR_MONTH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d{4})_(\d{1,2})(?:\D|$)").ok());

/// A monthly raster file located by the year and month in its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFile {
    pub year: i32,
    pub month: u32,
    pub path: PathBuf,
}

/// Extracts `(year, month)` from a name such as `rain_2021_3.tif` or `2021_03.tif`.
///
/// Only the first `YYYY_M` group counts; an out-of-range month there yields `None`.
pub fn parse_year_month(file_name: &str) -> Option<(i32, u32)> {
    let caps = YEAR_MONTH.as_ref()?.captures(file_name)?;
    let year = caps[1].parse::<i32>().ok()?;
    let month = caps[2].parse::<u32>().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
}

/// Lists the `.tif` files of `folder` in chronological order.
///
/// A `.tif` whose name carries no year and month fails the whole folder. When two
/// files map to the same month the one that sorts first by name wins.
pub fn index_stack_files(folder: &Path) -> Result<Vec<StackFile>, RasterError> {
    let entries =
        std::fs::read_dir(folder).map_err(|e| RasterError::FolderRead(folder.to_path_buf(), e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| RasterError::FolderRead(folder.to_path_buf(), e))?
            .path();
        if path.is_file() && is_tiff(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut by_month: BTreeMap<(i32, u32), PathBuf> = BTreeMap::new();
    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let key = parse_year_month(name).ok_or_else(|| RasterError::FileNameDate(path.clone()))?;
        if let Some(kept) = by_month.get(&key) {
            warn!(
                "Both {} and {} cover {}-{:02}, keeping the first",
                kept.display(),
                path.display(),
                key.0,
                key.1
            );
            continue;
        }
        by_month.insert(key, path);
    }

    debug!("Indexed {} monthly rasters in {}", by_month.len(), folder.display());
    Ok(by_month
        .into_iter()
        .map(|((year, month), path)| StackFile { year, month, path })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_year_month_variants() {
        assert_eq!(parse_year_month("rain_2021_3.tif"), Some((2021, 3)));
        assert_eq!(parse_year_month("2019_12.tif"), Some((2019, 12)));
        assert_eq!(parse_year_month("tmax_v2_2020_07_daily.tif"), Some((2020, 7)));
        assert_eq!(parse_year_month("rain_2021_13.tif"), None);
        assert_eq!(parse_year_month("rain.tif"), None);
    }

    #[test]
    fn first_year_month_group_wins() {
        assert_eq!(parse_year_month("era5_2022_1_v2023_2.tif"), Some((2022, 1)));
        assert_eq!(parse_year_month("chirps_2020_11_rev_1999_4.tif"), Some((2020, 11)));
    }

    #[test]
    fn indexes_chronologically_and_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "rain_2021_10.tif",
            "rain_2021_2.tif",
            "rain_2020_12.tif",
            "notes.txt",
            "rain_2021_02.tif",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let files = index_stack_files(dir.path()).unwrap();
        let months: Vec<(i32, u32)> = files.iter().map(|f| (f.year, f.month)).collect();
        assert_eq!(months, vec![(2020, 12), (2021, 2), (2021, 10)]);
        // "rain_2021_02.tif" sorts before "rain_2021_2.tif".
        assert!(files[1].path.ends_with("rain_2021_02.tif"));
    }

    #[test]
    fn undated_raster_fails_the_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rain_2021_1.tif"), b"").unwrap();
        std::fs::write(dir.path().join("undated.tif"), b"").unwrap();
        assert!(matches!(
            index_stack_files(dir.path()),
            Err(RasterError::FileNameDate(path)) if path.ends_with("undated.tif")
        ));
    }

    #[test]
    fn missing_folder_is_an_error() {
        assert!(matches!(
            index_stack_files(Path::new("/no/such/folder")),
            Err(RasterError::FolderRead(..))
        ));
    }
}
