pub mod plan;
pub mod runner;

pub use plan::{generate_cases, partition_by_model};
pub use runner::{ModelBinding, RunPolicy, Runner};
