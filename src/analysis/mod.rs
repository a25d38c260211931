// Exploratory analysis over the cleaned table

pub mod aggregates;
pub mod eda;
pub mod stats;

pub use eda::{explore, EdaSummary, RankedMovie};
pub use stats::{CorrelationMatrix, Describe};
