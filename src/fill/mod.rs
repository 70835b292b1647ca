pub mod error;
pub mod neighbors;
pub mod rescue;
pub mod spatial;
