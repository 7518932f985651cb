pub mod cache;
pub mod config;
pub mod corpus;
pub mod correlate;
pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod extract;
pub mod model;
pub mod providers;
pub mod report;
pub mod storage;
