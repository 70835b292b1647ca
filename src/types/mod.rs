pub mod lat_lon;
pub mod value_table;
