//! Builds the grid from a boundary file and runs every dataset of a config.
//!
//! Usage: `cargo run --example run_pipeline --features demos -- <config.json> <boundary.geojson> <raw_dir> <out_dir>`
//! Set RUST_LOG=info (or debug) to follow progress.

use hexfill::{HexFill, HexfillError};
use std::env;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), HexfillError> {
    env_logger::init();

    let args: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    let [config, boundary, raw_root, output_dir] = args.as_slice() else {
        eprintln!("usage: run_pipeline <config.json> <boundary.geojson> <raw_dir> <out_dir>");
        std::process::exit(2);
    };

    let hexfill = HexFill::from_json_file(config)?;
    std::fs::create_dir_all(output_dir)
        .map_err(|e| HexfillError::OutputDirCreation(output_dir.clone(), e))?;
    let grid = hexfill
        .build_grid()
        .boundary_path(boundary)
        .grid_path(&output_dir.join("h3_grid.geojson"))
        .call()?;
    println!("Grid has {} cells", grid.len());

    let report = hexfill
        .run()
        .grid(grid)
        .raw_root(raw_root)
        .output_dir(output_dir)
        .call()
        .await?;

    for dataset in &report.datasets {
        println!(
            "{}: {} records, absent {} -> {} -> {}",
            dataset.name,
            dataset.records,
            dataset.absent_after_sampling,
            dataset.absent_after_spatial,
            dataset.absent_after_rescue
        );
    }
    for skipped in &report.skipped {
        println!("{} skipped: {}", skipped.name, skipped.error);
    }
    println!(
        "Merged {} rows into {}",
        report.merge.rows,
        report.merged_path.display()
    );
    Ok(())
}
