pub mod boundary;
pub mod buffer;
pub mod error;
pub mod geojson;
pub mod grid_io;
pub mod hex_grid;
pub mod projection;
pub mod sample_points;
