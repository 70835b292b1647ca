pub mod error;
pub mod geotiff;
pub mod index;
pub mod sampler;
pub mod stack;
