pub mod bundle;
pub mod dataset;
pub mod error;
pub mod expander;
pub mod merge;
pub mod orchestrator;
pub mod output;
