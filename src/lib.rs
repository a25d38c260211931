pub mod analysis;
pub mod config;
pub mod constants;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod types;
pub mod visualization;
