pub mod aggregates;
pub mod census;
pub mod config;
pub mod context;
pub mod fetch;
pub mod output;
pub mod sales;

pub use context::{CensusMode, EstateContext};
